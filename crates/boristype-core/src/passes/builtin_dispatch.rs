//! Array, String and `Math` built-ins to helper calls and runtime primitives.
//!
//! The target runtime has almost none of the modern built-in surface. Calls whose
//! receiver is statically an array or a string are routed to the helper catalog,
//! padding omitted optional arguments with `undefined` so every helper is called
//! with its full arity. Receivers of unknown type are left alone.

use crate::ast::expression::{Expression, ExpressionKind};
use crate::ast::{NodeId, Program};
use crate::helpers::Helper;
use crate::pipeline::{LoweringPass, PassContext};
use crate::span::Span;
use crate::typeinfo::TypeCategory;
use crate::visit::{walk_expression, Fold};
use tracing::trace;

pub struct BuiltinDispatch;

impl LoweringPass for BuiltinDispatch {
    fn name(&self) -> &'static str {
        "builtin-dispatch"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        Dispatcher { ctx }.fold_program(program)
    }
}

/// A call that was not rewritten, handed back to the caller
type Untouched = (Expression, Vec<Expression>);

struct Dispatcher<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for Dispatcher<'_, '_> {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        let Expression { id, kind, span } = expr;
        match kind {
            ExpressionKind::Assignment(target, op, value) => {
                let target = self.fold_target(*target);
                let value = self.fold_expression(*value);
                Expression::with_id(
                    id,
                    ExpressionKind::Assignment(Box::new(target), op, Box::new(value)),
                    span,
                )
            }
            ExpressionKind::Update(op, position, target) => {
                let target = self.fold_target(*target);
                Expression::with_id(id, ExpressionKind::Update(op, position, Box::new(target)), span)
            }
            kind => {
                let expr = walk_expression(self, Expression::with_id(id, kind, span));
                self.rewrite(expr)
            }
        }
    }
}

impl Dispatcher<'_, '_> {
    /// Assignment targets keep their own shape; only their sub-expressions are rewritten
    fn fold_target(&mut self, target: Expression) -> Expression {
        let Expression { id, kind, span } = target;
        let kind = match kind {
            ExpressionKind::Member(object, property) => {
                ExpressionKind::Member(Box::new(self.fold_expression(*object)), property)
            }
            ExpressionKind::Index(object, index) => ExpressionKind::Index(
                Box::new(self.fold_expression(*object)),
                Box::new(self.fold_expression(*index)),
            ),
            other => return self.fold_expression(Expression::with_id(id, other, span)),
        };
        Expression::with_id(id, kind, span)
    }

    fn rewrite(&mut self, expr: Expression) -> Expression {
        let Expression { id, kind, span } = expr;
        match kind {
            ExpressionKind::Member(object, property) if property.node == "length" => {
                let helper = match self.ctx.type_of(&object) {
                    TypeCategory::Array => Helper::ArrayCount,
                    TypeCategory::String => Helper::StrCharCount,
                    TypeCategory::Unknown => {
                        return Expression::with_id(id, ExpressionKind::Member(object, property), span)
                    }
                };
                self.replace(id, helper, vec![*object], span)
            }
            ExpressionKind::Call(callee, arguments) => {
                let Expression {
                    id: callee_id,
                    kind: callee_kind,
                    span: callee_span,
                } = *callee;
                let ExpressionKind::Member(object, method) = callee_kind else {
                    let callee = Expression::with_id(callee_id, callee_kind, callee_span);
                    return Expression::with_id(id, ExpressionKind::Call(Box::new(callee), arguments), span);
                };

                let outcome = if object.is_identifier("Array") {
                    self.array_static(id, &method.node, *object, arguments, span)
                } else if object.is_identifier("Math") {
                    self.math(id, &method.node, *object, arguments, span)
                } else {
                    match self.ctx.type_of(&object) {
                        TypeCategory::Array => self.array_method(id, &method.node, *object, arguments, span),
                        TypeCategory::String => self.string_method(id, &method.node, *object, arguments, span),
                        TypeCategory::Unknown => Err((*object, arguments)),
                    }
                };

                outcome.unwrap_or_else(|(object, arguments)| {
                    let callee = Expression::with_id(
                        callee_id,
                        ExpressionKind::Member(Box::new(object), method),
                        callee_span,
                    );
                    Expression::with_id(id, ExpressionKind::Call(Box::new(callee), arguments), span)
                })
            }
            other => Expression::with_id(id, other, span),
        }
    }

    /// `helper(arguments)` carrying the id of the node it replaces, so later
    /// passes still get the oracle's answer for it
    fn replace(&mut self, id: NodeId, helper: Helper, arguments: Vec<Expression>, span: Span) -> Expression {
        trace!(helper = helper.name(), at = %span, "dispatched built-in");
        let call = self.ctx.call_helper(helper, arguments, span);
        Expression::with_id(id, call.kind, span)
    }

    fn array_static(
        &mut self,
        id: NodeId,
        method: &str,
        object: Expression,
        mut arguments: Vec<Expression>,
        span: Span,
    ) -> Result<Expression, Untouched> {
        let helper = match method {
            "isArray" => Helper::IsArray,
            "from" => Helper::ArraySelectAll,
            _ => return Err((object, arguments)),
        };
        if arguments.len() != 1 {
            return Err((object, arguments));
        }
        let value = arguments.remove(0);
        Ok(self.replace(id, helper, vec![value], span))
    }

    fn math(
        &mut self,
        id: NodeId,
        method: &str,
        object: Expression,
        arguments: Vec<Expression>,
        span: Span,
    ) -> Result<Expression, Untouched> {
        let Some(helper) = Helper::for_math_method(method) else {
            return Err((object, arguments));
        };
        match pad(helper.arity(), arguments, span) {
            Ok(arguments) => Ok(self.replace(id, helper, arguments, span)),
            Err(arguments) => Err((object, arguments)),
        }
    }

    fn array_method(
        &mut self,
        id: NodeId,
        method: &str,
        array: Expression,
        arguments: Vec<Expression>,
        span: Span,
    ) -> Result<Expression, Untouched> {
        match method {
            "concat" => {
                let mut parts = vec![array];
                parts.extend(arguments);
                Ok(self.replace(id, Helper::ArrayUnion, parts, span))
            }
            // Variadic tails travel as one array literal argument
            "splice" | "toSpliced" | "unshift" => {
                let (helper, positional) = match method {
                    "splice" => (Helper::ArraySplice, 2),
                    "toSpliced" => (Helper::ArrayToSpliced, 2),
                    _ => (Helper::ArrayUnshift, 0),
                };
                let mut arguments = arguments.into_iter();
                let mut parts = vec![array];
                for _ in 0..positional {
                    parts.push(arguments.next().unwrap_or_else(|| Expression::undefined(span)));
                }
                parts.push(Expression::array(arguments.collect(), span));
                Ok(self.replace(id, helper, parts, span))
            }
            _ => {
                let Some(helper) = Helper::for_array_method(method) else {
                    return Err((array, arguments));
                };
                let fixed = helper.arity().map(|arity| arity - 1);
                match pad(fixed, arguments, span) {
                    Ok(arguments) => {
                        let mut parts = vec![array];
                        parts.extend(arguments);
                        Ok(self.replace(id, helper, parts, span))
                    }
                    Err(arguments) => Err((array, arguments)),
                }
            }
        }
    }

    fn string_method(
        &mut self,
        id: NodeId,
        method: &str,
        string: Expression,
        arguments: Vec<Expression>,
        span: Span,
    ) -> Result<Expression, Untouched> {
        match (method, arguments.len()) {
            ("toUpperCase", 0) => Ok(self.replace(id, Helper::StrUpperCase, vec![string], span)),
            ("toLowerCase", 0) => Ok(self.replace(id, Helper::StrLowerCase, vec![string], span)),
            ("trim", 0) => Ok(self.replace(id, Helper::Trim, vec![string], span)),
            ("startsWith", 1) | ("includes", 1) | ("endsWith", 1) => {
                let helper = match method {
                    "startsWith" => Helper::StrBegins,
                    "includes" => Helper::StrContains,
                    _ => Helper::StrEnds,
                };
                let mut parts = vec![string];
                parts.extend(arguments);
                Ok(self.replace(id, helper, parts, span))
            }
            // The receiver is read twice, so it must be free of side effects
            ("startsWith", 2) | ("includes", 2) if string.is_simple_reference() => {
                let helper = if method == "startsWith" {
                    Helper::StrBegins
                } else {
                    Helper::StrContains
                };
                let mut arguments = arguments.into_iter();
                let (Some(search), Some(position)) = (arguments.next(), arguments.next()) else {
                    return Err((string, Vec::new()));
                };
                let count = self.ctx.call_helper(Helper::StrCharCount, vec![string.clone()], span);
                let tail = self
                    .ctx
                    .call_helper(Helper::StrCharRangePos, vec![string, position, count], span);
                Ok(self.replace(id, helper, vec![tail, search], span))
            }
            ("endsWith", 2) => {
                let mut arguments = arguments.into_iter();
                let (Some(search), Some(end)) = (arguments.next(), arguments.next()) else {
                    return Err((string, Vec::new()));
                };
                let head = self.ctx.call_helper(
                    Helper::StrCharRangePos,
                    vec![string, Expression::number(0.0, span), end],
                    span,
                );
                Ok(self.replace(id, Helper::StrEnds, vec![head, search], span))
            }
            _ => Err((string, arguments)),
        }
    }
}

/// Pads `arguments` with `undefined` up to `arity`. Hands the arguments back when
/// there are more than the helper accepts.
fn pad(arity: Option<usize>, mut arguments: Vec<Expression>, span: Span) -> Result<Vec<Expression>, Vec<Expression>> {
    let Some(arity) = arity else {
        return Ok(arguments);
    };
    if arguments.len() > arity {
        return Err(arguments);
    }
    arguments.resize_with(arity, || Expression::undefined(span));
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::Statement;
    use crate::passes::test_support::{emit, lower_with, run_passes};
    use indoc::indoc;

    fn dispatch(source: &str) -> String {
        lower_with(source, vec![Box::new(BuiltinDispatch)])
    }

    /// Emitted text without the prepended helper routines
    fn body(source: &str) -> String {
        let output = run_passes(source, vec![Box::new(BuiltinDispatch)]);
        let mut program = output.program;
        program.statements.retain(
            |statement| !matches!(statement, Statement::Function(f) if f.name.node.starts_with("___")),
        );
        emit(&program)
    }

    #[test]
    fn test_at_lowers_to_helper() {
        let output = dispatch("const last = [1, 2, 3, 4].at(-1);");
        assert!(output.contains("const last = ___btt_Array_at([1, 2, 3, 4], -1);"));
        assert!(output.starts_with("function ___btt_Array_at(array, index) {"));
    }

    #[test]
    fn test_length_lowers_to_count_primitives() {
        let text = body("const a = [1, 2, 3, 4]; const s = \"abc\"; log(a.length, s.length, o.length);");
        assert!(text.contains("log(ArrayCount(a), StrCharCount(s), o.length);"));
    }

    #[test]
    fn test_length_assignment_target_untouched() {
        let text = body("const a = [1]; a.length = 0;");
        assert!(text.contains("a.length = 0;"));
    }

    #[test]
    fn test_missing_arguments_padded() {
        let text = body("const a = [1, 2]; const b = a.slice(1); const c = a.indexOf(2);");
        assert!(text.contains("const b = ___btt_Array_slice(a, 1, undefined);"));
        assert!(text.contains("const c = ___btt_Array_indexOf(a, 2, undefined);"));
    }

    #[test]
    fn test_variadic_tail_collected() {
        let text = body("const a = [1, 2]; a.splice(0, 1, 7, 8); a.unshift(5, 6); a.splice(1);");
        assert!(text.contains("___btt_Array_splice(a, 0, 1, [7, 8]);"));
        assert!(text.contains("___btt_Array_unshift(a, [5, 6]);"));
        assert!(text.contains("___btt_Array_splice(a, 1, undefined, []);"));
    }

    #[test]
    fn test_concat_becomes_union() {
        let text = body("const a = [1]; const b = a.concat([2], c);");
        assert!(text.contains("const b = ArrayUnion(a, [2], c);"));
    }

    #[test]
    fn test_push_and_unknown_receivers_untouched() {
        let text = body("const a = [1]; a.push(2); x.at(0); x.slice(1);");
        assert!(text.contains("a.push(2);"));
        assert!(text.contains("x.at(0);"));
        assert!(text.contains("x.slice(1);"));
    }

    #[test]
    fn test_globals() {
        let text = body("const r = [Array.isArray(v), Array.from(v), Math.max(1, 2, 3), Math.floor(x), Math.random()];");
        assert!(text.contains(
            "[IsArray(v), ArraySelectAll(v), Max(1, 2, 3), ___btt_Math_floor(x), ___btt_Math_random()]"
        ));
    }

    #[test]
    fn test_string_methods() {
        let text = body(indoc! {r#"
            const s = "Hello";
            log(s.toUpperCase(), s.trim(), s.startsWith("H"), s.endsWith("o"), s.includes("l"));
            log(s.startsWith("l", 2), s.endsWith("l", 3));
        "#});
        assert!(text.contains(
            r#"log(StrUpperCase(s), Trim(s), StrBegins(s, "H"), StrEnds(s, "o"), StrContains(s, "l"));"#
        ));
        assert!(text.contains(
            r#"log(StrBegins(StrCharRangePos(s, 2, StrCharCount(s)), "l"), StrEnds(StrCharRangePos(s, 0, 3), "l"));"#
        ));
    }

    #[test]
    fn test_nested_receivers_keep_types() {
        let text = body("const a = [3, 1, 2]; const n = a.slice(1).at(0);");
        assert!(text.contains("const n = ___btt_Array_at(___btt_Array_slice(a, 1, undefined), 0);"));
    }

    #[test]
    fn test_primitives_never_injected() {
        let output = run_passes("const a = [1]; log(a.length);", vec![Box::new(BuiltinDispatch)]);
        assert!(output.helpers.contains(Helper::ArrayCount));
        assert_eq!(output.helpers.injectables().count(), 0);
    }
}
