use crate::ast::expression::{
    ArrowBody, ArrowFunction, BinaryOp, Expression, ExpressionKind, FunctionExpression,
    ObjectProperty, Parameter, PropertyKey, TemplateLiteral,
};
use crate::ast::pattern::Pattern;
use crate::ast::statement::{Block, IfStatement, ReturnStatement, Statement, VariableDeclaration, VariableDeclarator, VariableKind};
use crate::ast::{Ident, Program};
use crate::pipeline::{LoweringPass, PassContext};
use crate::visit::{walk_block, walk_expression, walk_parameter, Fold};

/// Arrow functions, template literals, shorthand and method properties, and
/// parameter defaults
pub struct SyntaxSugarLowering;

impl LoweringPass for SyntaxSugarLowering {
    fn name(&self) -> &'static str {
        "syntax-sugar"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        Desugar { ctx }.fold_program(program)
    }
}

struct Desugar<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for Desugar<'_, '_> {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        let Expression { id, kind, span } = expr;
        let kind = match kind {
            ExpressionKind::Arrow(arrow) => ExpressionKind::Function(arrow_to_function(arrow)),
            ExpressionKind::Object(properties) => {
                ExpressionKind::Object(properties.into_iter().map(explicit_property).collect())
            }
            other => other,
        };

        let expr = walk_expression(self, Expression::with_id(id, kind, span));
        match expr.kind {
            ExpressionKind::Template(template) => concatenate(expr.id, template),
            kind => Expression::with_id(expr.id, kind, expr.span),
        }
    }

    fn fold_function_body(&mut self, parameters: Vec<Parameter>, body: Block) -> (Vec<Parameter>, Block) {
        let mut prologue = Vec::new();
        let mut lowered = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let Parameter {
                pattern,
                type_annotation,
                default,
                span,
            } = walk_parameter(self, parameter);

            let Some(default) = default else {
                lowered.push(Parameter {
                    pattern,
                    type_annotation,
                    default: None,
                    span,
                });
                continue;
            };

            // `p = d` becomes a plain `p` plus an `undefined` check at the top of the body;
            // a pattern gets a fresh name and is bound from it after the check
            let (name, binding) = match pattern {
                Pattern::Identifier(ident) => (ident, None),
                pattern => (Ident::new(self.ctx.fresh_name("_ref"), span), Some(pattern)),
            };

            let reference = Expression::identifier(name.node.clone(), span);
            prologue.push(Statement::If(IfStatement {
                condition: Expression::binary(
                    BinaryOp::StrictEqual,
                    reference.clone(),
                    Expression::undefined(span),
                    span,
                ),
                consequent: Box::new(Statement::Block(Block::new(
                    vec![Statement::assign(reference.clone(), default, span)],
                    span,
                ))),
                alternate: None,
                span,
            }));

            match binding {
                Some(pattern) => {
                    prologue.push(Statement::Variable(VariableDeclaration {
                        kind: VariableKind::Let,
                        declarators: vec![VariableDeclarator {
                            pattern,
                            type_annotation: type_annotation.clone(),
                            initializer: Some(reference),
                            span,
                        }],
                        span,
                    }));
                    lowered.push(Parameter {
                        pattern: Pattern::Identifier(name),
                        type_annotation,
                        default: None,
                        span,
                    });
                }
                None => lowered.push(Parameter {
                    pattern: Pattern::Identifier(name),
                    type_annotation,
                    default: None,
                    span,
                }),
            }
        }

        let mut body = walk_block(self, body);
        if !prologue.is_empty() {
            prologue.append(&mut body.statements);
            body.statements = prologue;
        }
        (lowered, body)
    }
}

fn arrow_to_function(arrow: ArrowFunction) -> FunctionExpression {
    let body = match arrow.body {
        ArrowBody::Block(block) => block,
        ArrowBody::Expression(result) => {
            let span = result.span;
            Block::new(
                vec![Statement::Return(ReturnStatement {
                    argument: Some(*result),
                    span,
                })],
                span,
            )
        }
    };
    FunctionExpression {
        name: None,
        parameters: arrow.parameters,
        return_type: arrow.return_type,
        body,
        span: arrow.span,
    }
}

fn explicit_property(property: ObjectProperty) -> ObjectProperty {
    match property {
        ObjectProperty::Shorthand(ident) => {
            let span = ident.span;
            ObjectProperty::Property {
                value: Expression::identifier(ident.node.clone(), span),
                key: PropertyKey::Identifier(ident),
                span,
            }
        }
        ObjectProperty::Method {
            key,
            function,
            span,
        } => ObjectProperty::Property {
            key,
            value: Expression::new(ExpressionKind::Function(function), span),
            span,
        },
        other => other,
    }
}

/// `` `a${x}b` `` as `"a" + x + "b"`. The leading chunk is always kept, even when
/// empty, so the chain is a string concatenation from its first operand.
fn concatenate(id: crate::ast::NodeId, template: TemplateLiteral) -> Expression {
    let span = template.span;
    let mut quasis = template.quasis.into_iter();
    let mut result = Expression::string(quasis.next().unwrap_or_default(), span);

    for (expression, quasi) in template.expressions.into_iter().zip(quasis.by_ref()) {
        result = Expression::binary(BinaryOp::Add, result, expression, span);
        if !quasi.is_empty() {
            result = Expression::binary(BinaryOp::Add, result, Expression::string(quasi, span), span);
        }
    }

    Expression::with_id(id, result.kind, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::lower_with;
    use indoc::indoc;

    fn desugar(source: &str) -> String {
        lower_with(source, vec![Box::new(SyntaxSugarLowering)])
    }

    #[test]
    fn test_arrow_expression_body_returns() {
        let output = desugar("const f = (a, b) => a + b;");
        assert_eq!(
            output,
            indoc! {"
                const f = function(a, b) {
                    return a + b;
                };
            "}
        );
    }

    #[test]
    fn test_arrow_block_body_kept() {
        let output = desugar("const f = x => { log(x); };");
        assert!(output.contains("const f = function(x) {\n    log(x);\n};"));
    }

    #[test]
    fn test_template_literal_concatenation() {
        assert_eq!(desugar("const s = `a${x}b${y}`;"), "const s = \"a\" + x + \"b\" + y;\n");
        assert_eq!(desugar("const s = `${x}`;"), "const s = \"\" + x;\n");
        assert_eq!(desugar("const s = `plain`;"), "const s = \"plain\";\n");
    }

    #[test]
    fn test_template_substitution_keeps_grouping() {
        assert_eq!(desugar("const s = `n=${a - b}`;"), "const s = \"n=\" + (a - b);\n");
    }

    #[test]
    fn test_shorthand_and_method_properties() {
        let output = desugar("const o = { a, m() { return 1; } };");
        assert!(output.contains("a: a"));
        assert!(output.contains("m: function() {"));
    }

    #[test]
    fn test_parameter_default_checked_in_body() {
        let output = desugar("function f(a, b = 2) { return a + b; }");
        assert_eq!(
            output,
            indoc! {"
                function f(a, b) {
                    if (b === undefined) {
                        b = 2;
                    }
                    return a + b;
                }
            "}
        );
    }

    #[test]
    fn test_pattern_default_bound_from_fresh_parameter() {
        let output = desugar("function f({ a } = {}) { return a; }");
        assert!(output.contains("function f(_ref) {"));
        assert!(output.contains("if (_ref === undefined) {\n        _ref = {};\n    }"));
        assert!(output.contains("let { a } = _ref;"));
    }

    #[test]
    fn test_nested_arrows_converted() {
        let output = desugar("const f = () => () => 1;");
        assert!(!output.contains("=>"));
        assert!(output.contains("return function() {"));
    }
}
