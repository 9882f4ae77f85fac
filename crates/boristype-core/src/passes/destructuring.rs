//! Binding patterns to sequential plain declarations.
//!
//! `const { a, b: [c, d], ...rest } = init;` becomes one declaration per bound name,
//! reading from the initializer (or an auxiliary holding it) in declared order. Rest
//! targets go through the rest-extraction helpers; a rest inside a nested pattern is
//! deferred to a runtime error.

use crate::ast::expression::{BinaryOp, Expression, Parameter, PropertyKey};
use crate::ast::pattern::Pattern;
use crate::ast::statement::{Block, Statement, VariableDeclaration, VariableDeclarator, VariableKind};
use crate::ast::types::TypeAnnotation;
use crate::ast::{Ident, Program};
use crate::helpers::Helper;
use crate::pipeline::{LoweringPass, PassContext};
use crate::span::Span;
use crate::typeinfo::TypeCategory;
use crate::visit::{walk_function_body, walk_statement, Fold};
use tracing::trace;

const NESTED_REST_MESSAGE: &str = "Rest elements in nested destructuring patterns are not supported";

pub struct DestructuringLowering;

impl LoweringPass for DestructuringLowering {
    fn name(&self) -> &'static str {
        "destructuring"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        Flattener { ctx }.fold_program(program)
    }
}

struct Flattener<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for Flattener<'_, '_> {
    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        let folded = walk_statement(self, statement);
        let mut result = Vec::with_capacity(folded.len());
        for statement in folded {
            match statement {
                Statement::Variable(declaration) => self.split_declaration(declaration, &mut result),
                other => result.push(other),
            }
        }
        result
    }

    fn fold_function_body(&mut self, parameters: Vec<Parameter>, body: Block) -> (Vec<Parameter>, Block) {
        let (parameters, mut body) = walk_function_body(self, parameters, body);

        let mut prologue = Vec::new();
        let parameters = parameters
            .into_iter()
            .map(|parameter| {
                if parameter.pattern.is_identifier() {
                    return parameter;
                }
                let span = parameter.span;
                let name = self.ctx.fresh_name("_ref");
                let reference = Expression::identifier(name.clone(), span);
                self.bind(VariableKind::Let, parameter.pattern, reference, None, 0, &mut prologue);
                Parameter {
                    pattern: Pattern::Identifier(Ident::new(name, span)),
                    type_annotation: parameter.type_annotation,
                    default: parameter.default,
                    span,
                }
            })
            .collect();

        if !prologue.is_empty() {
            prologue.append(&mut body.statements);
            body.statements = prologue;
        }
        (parameters, body)
    }
}

impl Flattener<'_, '_> {
    /// One declaration per declarator, patterns flattened in place
    fn split_declaration(&mut self, declaration: VariableDeclaration, out: &mut Vec<Statement>) {
        let kind = declaration.kind;
        let plain = declaration.declarators.len() == 1
            && declaration.declarators.iter().all(|d| d.pattern.is_identifier());
        if plain {
            out.push(Statement::Variable(declaration));
            return;
        }

        for declarator in declaration.declarators {
            let VariableDeclarator {
                pattern,
                type_annotation,
                initializer,
                span,
            } = declarator;

            if pattern.is_identifier() {
                out.push(Statement::Variable(VariableDeclaration {
                    kind,
                    declarators: vec![VariableDeclarator {
                        pattern,
                        type_annotation,
                        initializer,
                        span,
                    }],
                    span,
                }));
                continue;
            }

            trace!(at = %span, "flattening binding pattern");
            let init = initializer.unwrap_or_else(|| Expression::undefined(span));
            self.bind(kind, pattern, init, type_annotation, 0, out);
        }
    }

    /// Emits declarations binding every name in `pattern` from `value`
    fn bind(
        &mut self,
        kind: VariableKind,
        pattern: Pattern,
        value: Expression,
        type_annotation: Option<TypeAnnotation>,
        depth: usize,
        out: &mut Vec<Statement>,
    ) {
        match pattern {
            Pattern::Identifier(name) => {
                let span = name.span;
                out.push(declaration(kind, name, type_annotation, value, span));
            }
            Pattern::Object(object) => {
                let span = object.span;
                let base = if value.as_identifier().is_some() {
                    value
                } else {
                    let aux = self.ctx.fresh_name("_obj");
                    out.push(Statement::declare(kind, aux.clone(), Some(value), span));
                    Expression::identifier(aux, span)
                };

                let mut consumed = Vec::with_capacity(object.properties.len());
                for property in object.properties {
                    consumed.push(Expression::string(property.key.name(), property.span));
                    let read = read_key(base.clone(), &property.key, property.span);
                    let read = with_default(read, property.default, property.span);
                    self.bind(kind, property.value, read, None, depth + 1, out);
                }

                if let Some(rest) = object.rest {
                    let value = if depth == 0 {
                        let excluded = Expression::array(consumed, span);
                        self.ctx.call_helper(Helper::ObjectRest, vec![base, excluded], span)
                    } else {
                        self.not_supported(span)
                    };
                    out.push(declaration(kind, rest, None, value, span));
                }
            }
            Pattern::Array(array) => {
                let span = array.span;
                let aux = self.ctx.fresh_name("_arr");
                let direct = self.ctx.call_helper(Helper::ArrayDirect, vec![value], span);
                self.ctx.record_name_type(&aux, TypeCategory::Array);
                out.push(Statement::declare(kind, aux.clone(), Some(direct), span));
                let base = Expression::identifier(aux, span);

                let positions = array.elements.len();
                for (position, element) in array.elements.into_iter().enumerate() {
                    let Some(element) = element else {
                        continue;
                    };
                    let element_span = element.pattern.span();
                    let read = Expression::index(
                        base.clone(),
                        Expression::number(position as f64, element_span),
                        element_span,
                    );
                    let read = with_default(read, element.default, element_span);
                    self.bind(kind, element.pattern, read, None, depth + 1, out);
                }

                if let Some(rest) = array.rest {
                    let value = if depth == 0 {
                        let start = Expression::number(positions as f64, span);
                        self.ctx.call_helper(Helper::ArrayRest, vec![base, start], span)
                    } else {
                        self.not_supported(span)
                    };
                    out.push(declaration(kind, rest, None, value, span));
                }
            }
        }
    }

    fn not_supported(&mut self, span: Span) -> Expression {
        self.ctx.warn(span, NESTED_REST_MESSAGE);
        self.ctx
            .call_helper(Helper::NotSupported, vec![Expression::string(NESTED_REST_MESSAGE, span)], span)
    }
}

fn declaration(
    kind: VariableKind,
    name: Ident,
    type_annotation: Option<TypeAnnotation>,
    value: Expression,
    span: Span,
) -> Statement {
    Statement::Variable(VariableDeclaration {
        kind,
        declarators: vec![VariableDeclarator {
            pattern: Pattern::Identifier(name),
            type_annotation,
            initializer: Some(value),
            span,
        }],
        span,
    })
}

/// `base.key`, or `base["key"]` when the key is not an identifier
fn read_key(base: Expression, key: &PropertyKey, span: Span) -> Expression {
    match key {
        PropertyKey::Identifier(ident) => Expression::member(base, ident.node.clone(), span),
        PropertyKey::String(value) => Expression::index(base, Expression::string(value.clone(), span), span),
        PropertyKey::Number(value) => Expression::index(base, Expression::number(*value, span), span),
    }
}

/// `read === undefined ? default : read`
fn with_default(read: Expression, default: Option<Expression>, span: Span) -> Expression {
    match default {
        Some(default) => Expression::conditional(
            Expression::binary(BinaryOp::StrictEqual, read.clone(), Expression::undefined(span), span),
            default,
            read,
            span,
        ),
        None => read,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::{emit, run_passes};
    use indoc::indoc;

    /// Lowered text with the prepended helper routines removed
    fn lower(source: &str) -> String {
        let mut program = run_passes(source, vec![Box::new(DestructuringLowering)]).program;
        program
            .statements
            .retain(|statement| !matches!(statement, Statement::Function(f) if f.name.node.starts_with("___btp")));
        emit(&program)
    }

    #[test]
    fn test_object_pattern_with_rest() {
        let output = lower("const { a, b, ...rest } = obj;");
        assert_eq!(
            output,
            indoc! {r#"
                const a = obj.a;
                const b = obj.b;
                const rest = ___btp_object_rest(obj, ["a", "b"]);
            "#}
        );
    }

    #[test]
    fn test_array_pattern_with_rest() {
        let output = lower("const [first, second, ...rest] = [10, 20, 30];");
        assert_eq!(
            output,
            indoc! {"
                const _arr = ArrayDirect([10, 20, 30]);
                const first = _arr[0];
                const second = _arr[1];
                const rest = ___btp_array_rest(_arr, 2);
            "}
        );
    }

    #[test]
    fn test_rest_helpers_injected() {
        let output = run_passes(
            "const { a, ...o } = x; const [b, ...r] = y;",
            vec![Box::new(DestructuringLowering)],
        );
        assert!(output.helpers.contains(Helper::ObjectRest));
        assert!(output.helpers.contains(Helper::ArrayRest));
        assert!(!output.helpers.contains(Helper::NotSupported));
    }

    #[test]
    fn test_complex_initializer_evaluated_once() {
        let output = lower("let { a, b } = load();");
        assert_eq!(
            output,
            indoc! {"
                let _obj = load();
                let a = _obj.a;
                let b = _obj.b;
            "}
        );
    }

    #[test]
    fn test_renamed_and_quoted_keys() {
        let output = lower(r#"const { a: x, "b-c": y, 0: z } = o;"#);
        assert!(output.contains("const x = o.a;"));
        assert!(output.contains(r#"const y = o["b-c"];"#));
        assert!(output.contains("const z = o[0];"));
    }

    #[test]
    fn test_defaults_and_holes() {
        let output = lower("const [a = 1, , c] = list; const { d = 2 } = o;");
        assert!(output.contains("const a = _arr[0] === undefined ? 1 : _arr[0];"));
        assert!(!output.contains("_arr[1]"));
        assert!(output.contains("const c = _arr[2];"));
        assert!(output.contains("const d = o.d === undefined ? 2 : o.d;"));
    }

    #[test]
    fn test_nested_patterns_recurse() {
        let output = lower("const { a: { b }, c: [d] } = o;");
        assert!(output.contains("const _obj = o.a;"));
        assert!(output.contains("const b = _obj.b;"));
        assert!(output.contains("const _arr = ArrayDirect(o.c);"));
        assert!(output.contains("const d = _arr[0];"));
    }

    #[test]
    fn test_nested_rest_deferred_to_runtime() {
        let output = run_passes("const { a: { ...inner } } = o;", vec![Box::new(DestructuringLowering)]);
        assert!(output.helpers.contains(Helper::NotSupported));
        assert_eq!(output.diagnostics.len(), 1);
        let text = emit(&output.program);
        assert!(text.contains("const inner = ___btp_not_supported("));
    }

    #[test]
    fn test_multiple_declarators_split() {
        let output = lower("let x = 1, [y] = z, w;");
        assert!(output.starts_with("let x = 1;\nlet _arr = ArrayDirect(z);\nlet y = _arr[0];\nlet w;\n"));
    }

    #[test]
    fn test_pattern_parameter_bound_in_body() {
        let output = lower("function f({ a, b }, [c]) { return a + b + c; }");
        assert_eq!(
            output,
            indoc! {"
                function f(_ref, _ref_1) {
                    let a = _ref.a;
                    let b = _ref.b;
                    let _arr = ArrayDirect(_ref_1);
                    let c = _arr[0];
                    return a + b + c;
                }
            "}
        );
    }
}
