//! Consuming tree traversal shared by the lowering passes.
//!
//! Every pass takes the tree by value and rebuilds it. A pass overrides the hooks it
//! cares about and calls the matching `walk_*` function to recurse into the rest.
//! Statement hooks return a `Vec` so a single statement can expand into several;
//! positions that hold exactly one statement (an `if` branch, a loop body) are
//! re-wrapped with [`Statement::from_statements`].

use crate::ast::expression::*;
use crate::ast::pattern::*;
use crate::ast::statement::*;
use crate::ast::{Ident, Program};

pub trait Fold: Sized {
    fn fold_program(&mut self, program: Program) -> Program {
        walk_program(self, program)
    }

    fn fold_statements(&mut self, statements: Vec<Statement>) -> Vec<Statement> {
        walk_statements(self, statements)
    }

    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        walk_statement(self, statement)
    }

    fn fold_block(&mut self, block: Block) -> Block {
        walk_block(self, block)
    }

    fn fold_expression(&mut self, expr: Expression) -> Expression {
        walk_expression(self, expr)
    }

    fn fold_pattern(&mut self, pattern: Pattern) -> Pattern {
        walk_pattern(self, pattern)
    }

    /// Parameters and body of any function-like node
    fn fold_function_body(
        &mut self,
        parameters: Vec<Parameter>,
        body: Block,
    ) -> (Vec<Parameter>, Block) {
        walk_function_body(self, parameters, body)
    }

    /// A name introduced by a declaration, parameter, pattern or import
    fn fold_binding(&mut self, ident: Ident) -> Ident {
        ident
    }

    /// A property name after `.`, or a key in an object literal or pattern
    fn fold_property_name(&mut self, ident: Ident) -> Ident {
        ident
    }
}

pub fn walk_program<F: Fold>(folder: &mut F, program: Program) -> Program {
    let Program {
        statements,
        directives,
        node_count,
        span,
    } = program;
    Program {
        statements: folder.fold_statements(statements),
        directives,
        node_count,
        span,
    }
}

pub fn walk_statements<F: Fold>(folder: &mut F, statements: Vec<Statement>) -> Vec<Statement> {
    let mut result = Vec::with_capacity(statements.len());
    for statement in statements {
        result.extend(folder.fold_statement(statement));
    }
    result
}

pub fn walk_block<F: Fold>(folder: &mut F, block: Block) -> Block {
    Block {
        statements: folder.fold_statements(block.statements),
        span: block.span,
    }
}

/// Folds a statement sitting in a single-statement position
pub fn fold_nested<F: Fold>(folder: &mut F, statement: Box<Statement>) -> Box<Statement> {
    let span = statement.span();
    Box::new(Statement::from_statements(folder.fold_statement(*statement), span))
}

pub fn walk_variable_declaration<F: Fold>(
    folder: &mut F,
    declaration: VariableDeclaration,
) -> VariableDeclaration {
    VariableDeclaration {
        kind: declaration.kind,
        declarators: declaration
            .declarators
            .into_iter()
            .map(|declarator| VariableDeclarator {
                pattern: folder.fold_pattern(declarator.pattern),
                type_annotation: declarator.type_annotation,
                initializer: declarator.initializer.map(|init| folder.fold_expression(init)),
                span: declarator.span,
            })
            .collect(),
        span: declaration.span,
    }
}

pub fn walk_for_head<F: Fold>(folder: &mut F, head: ForHead) -> ForHead {
    match head {
        ForHead::Declaration {
            kind,
            pattern,
            span,
        } => ForHead::Declaration {
            kind,
            pattern: folder.fold_pattern(pattern),
            span,
        },
        ForHead::Target(target) => ForHead::Target(folder.fold_expression(target)),
    }
}

pub fn walk_function_declaration<F: Fold>(
    folder: &mut F,
    function: FunctionDeclaration,
) -> FunctionDeclaration {
    let name = folder.fold_binding(function.name);
    let (parameters, body) = folder.fold_function_body(function.parameters, function.body);
    FunctionDeclaration {
        name,
        parameters,
        return_type: function.return_type,
        body,
        span: function.span,
    }
}

pub fn walk_function_expression<F: Fold>(
    folder: &mut F,
    function: FunctionExpression,
) -> FunctionExpression {
    let name = function.name.map(|name| folder.fold_binding(name));
    let (parameters, body) = folder.fold_function_body(function.parameters, function.body);
    FunctionExpression {
        name,
        parameters,
        return_type: function.return_type,
        body,
        span: function.span,
    }
}

pub fn walk_function_body<F: Fold>(
    folder: &mut F,
    parameters: Vec<Parameter>,
    body: Block,
) -> (Vec<Parameter>, Block) {
    let parameters = parameters
        .into_iter()
        .map(|parameter| walk_parameter(folder, parameter))
        .collect();
    (parameters, folder.fold_block(body))
}

pub fn walk_parameter<F: Fold>(folder: &mut F, parameter: Parameter) -> Parameter {
    Parameter {
        pattern: folder.fold_pattern(parameter.pattern),
        type_annotation: parameter.type_annotation,
        default: parameter.default.map(|default| folder.fold_expression(default)),
        span: parameter.span,
    }
}

pub fn walk_statement<F: Fold>(folder: &mut F, statement: Statement) -> Vec<Statement> {
    let folded = match statement {
        Statement::Variable(declaration) => {
            Statement::Variable(walk_variable_declaration(folder, declaration))
        }
        Statement::Function(function) => {
            Statement::Function(walk_function_declaration(folder, function))
        }
        Statement::Expression(expr) => Statement::Expression(folder.fold_expression(expr)),
        Statement::Block(block) => Statement::Block(folder.fold_block(block)),
        Statement::If(stmt) => Statement::If(IfStatement {
            condition: folder.fold_expression(stmt.condition),
            consequent: fold_nested(folder, stmt.consequent),
            alternate: stmt.alternate.map(|alternate| fold_nested(folder, alternate)),
            span: stmt.span,
        }),
        Statement::For(stmt) => Statement::For(ForStatement {
            init: stmt.init.map(|init| match init {
                ForInit::Variable(declaration) => {
                    ForInit::Variable(walk_variable_declaration(folder, declaration))
                }
                ForInit::Expression(expr) => ForInit::Expression(folder.fold_expression(expr)),
            }),
            test: stmt.test.map(|test| folder.fold_expression(test)),
            update: stmt.update.map(|update| folder.fold_expression(update)),
            body: fold_nested(folder, stmt.body),
            span: stmt.span,
        }),
        Statement::ForIn(stmt) => Statement::ForIn(ForInStatement {
            head: walk_for_head(folder, stmt.head),
            object: folder.fold_expression(stmt.object),
            body: fold_nested(folder, stmt.body),
            span: stmt.span,
        }),
        Statement::ForOf(stmt) => Statement::ForOf(ForOfStatement {
            head: walk_for_head(folder, stmt.head),
            iterable: folder.fold_expression(stmt.iterable),
            body: fold_nested(folder, stmt.body),
            span: stmt.span,
        }),
        Statement::While(stmt) => Statement::While(WhileStatement {
            condition: folder.fold_expression(stmt.condition),
            body: fold_nested(folder, stmt.body),
            span: stmt.span,
        }),
        Statement::DoWhile(stmt) => Statement::DoWhile(DoWhileStatement {
            body: fold_nested(folder, stmt.body),
            condition: folder.fold_expression(stmt.condition),
            span: stmt.span,
        }),
        Statement::Switch(stmt) => Statement::Switch(SwitchStatement {
            discriminant: folder.fold_expression(stmt.discriminant),
            cases: stmt
                .cases
                .into_iter()
                .map(|case| SwitchCase {
                    test: case.test.map(|test| folder.fold_expression(test)),
                    consequent: folder.fold_statements(case.consequent),
                    span: case.span,
                })
                .collect(),
            span: stmt.span,
        }),
        Statement::Try(stmt) => Statement::Try(TryStatement {
            block: folder.fold_block(stmt.block),
            handler: stmt.handler.map(|handler| CatchClause {
                parameter: handler.parameter.map(|parameter| folder.fold_binding(parameter)),
                body: folder.fold_block(handler.body),
                span: handler.span,
            }),
            finalizer: stmt.finalizer.map(|finalizer| folder.fold_block(finalizer)),
            span: stmt.span,
        }),
        Statement::Throw(stmt) => Statement::Throw(ThrowStatement {
            argument: folder.fold_expression(stmt.argument),
            span: stmt.span,
        }),
        Statement::Return(stmt) => Statement::Return(ReturnStatement {
            argument: stmt.argument.map(|argument| folder.fold_expression(argument)),
            span: stmt.span,
        }),
        Statement::Import(import) => Statement::Import(ImportDeclaration {
            specifiers: import
                .specifiers
                .into_iter()
                .map(|specifier| match specifier {
                    ImportSpecifier::Default(local) => ImportSpecifier::Default(folder.fold_binding(local)),
                    ImportSpecifier::Namespace(local) => {
                        ImportSpecifier::Namespace(folder.fold_binding(local))
                    }
                    ImportSpecifier::Named { imported, local } => ImportSpecifier::Named {
                        imported: folder.fold_property_name(imported),
                        local: folder.fold_binding(local),
                    },
                })
                .collect(),
            source: import.source,
            span: import.span,
        }),
        Statement::Export(export) => Statement::Export(ExportDeclaration {
            kind: match export.kind {
                ExportKind::Declaration(inner) => ExportKind::Declaration(fold_nested(folder, inner)),
                ExportKind::DefaultDeclaration(inner) => {
                    ExportKind::DefaultDeclaration(fold_nested(folder, inner))
                }
                ExportKind::DefaultExpression(expr) => {
                    ExportKind::DefaultExpression(folder.fold_expression(expr))
                }
                ExportKind::Named { specifiers, source } => ExportKind::Named {
                    specifiers: specifiers
                        .into_iter()
                        .map(|specifier| ExportSpecifier {
                            local: folder.fold_binding(specifier.local),
                            exported: folder.fold_property_name(specifier.exported),
                        })
                        .collect(),
                    source,
                },
                ExportKind::All { alias, source } => ExportKind::All {
                    alias: alias.map(|alias| folder.fold_property_name(alias)),
                    source,
                },
            },
            span: export.span,
        }),
        other @ (Statement::Break(_) | Statement::Continue(_) | Statement::Empty(_)) => other,
    };
    vec![folded]
}

pub fn walk_property_key<F: Fold>(folder: &mut F, key: PropertyKey) -> PropertyKey {
    match key {
        PropertyKey::Identifier(ident) => PropertyKey::Identifier(folder.fold_property_name(ident)),
        other => other,
    }
}

pub fn walk_expression<F: Fold>(folder: &mut F, expr: Expression) -> Expression {
    let Expression { id, kind, span } = expr;
    let kind = match kind {
        ExpressionKind::Array(elements) => ExpressionKind::Array(
            elements
                .into_iter()
                .map(|element| match element {
                    ArrayElement::Expression(value) => {
                        ArrayElement::Expression(folder.fold_expression(value))
                    }
                    ArrayElement::Spread(source) => ArrayElement::Spread(folder.fold_expression(source)),
                    ArrayElement::Hole => ArrayElement::Hole,
                })
                .collect(),
        ),
        ExpressionKind::Object(properties) => ExpressionKind::Object(
            properties
                .into_iter()
                .map(|property| match property {
                    ObjectProperty::Property { key, value, span } => ObjectProperty::Property {
                        key: walk_property_key(folder, key),
                        value: folder.fold_expression(value),
                        span,
                    },
                    ObjectProperty::Shorthand(ident) => {
                        ObjectProperty::Shorthand(folder.fold_binding(ident))
                    }
                    ObjectProperty::Method {
                        key,
                        function,
                        span,
                    } => ObjectProperty::Method {
                        key: walk_property_key(folder, key),
                        function: walk_function_expression(folder, function),
                        span,
                    },
                    ObjectProperty::Spread { value, span } => ObjectProperty::Spread {
                        value: folder.fold_expression(value),
                        span,
                    },
                })
                .collect(),
        ),
        ExpressionKind::Function(function) => {
            ExpressionKind::Function(walk_function_expression(folder, function))
        }
        ExpressionKind::Arrow(arrow) => {
            let ArrowFunction {
                parameters,
                return_type,
                body,
                span,
            } = arrow;
            let (parameters, body) = match body {
                ArrowBody::Block(block) => {
                    let (parameters, block) = folder.fold_function_body(parameters, block);
                    (parameters, ArrowBody::Block(block))
                }
                ArrowBody::Expression(body) => {
                    let parameters = parameters
                        .into_iter()
                        .map(|parameter| walk_parameter(folder, parameter))
                        .collect();
                    (parameters, ArrowBody::Expression(Box::new(folder.fold_expression(*body))))
                }
            };
            ExpressionKind::Arrow(ArrowFunction {
                parameters,
                return_type,
                body,
                span,
            })
        }
        ExpressionKind::Template(template) => ExpressionKind::Template(TemplateLiteral {
            quasis: template.quasis,
            expressions: template
                .expressions
                .into_iter()
                .map(|part| folder.fold_expression(part))
                .collect(),
            span: template.span,
        }),
        ExpressionKind::Unary(op, operand) => {
            ExpressionKind::Unary(op, Box::new(folder.fold_expression(*operand)))
        }
        ExpressionKind::Update(op, position, target) => {
            ExpressionKind::Update(op, position, Box::new(folder.fold_expression(*target)))
        }
        ExpressionKind::Binary(op, left, right) => ExpressionKind::Binary(
            op,
            Box::new(folder.fold_expression(*left)),
            Box::new(folder.fold_expression(*right)),
        ),
        ExpressionKind::Assignment(target, op, value) => ExpressionKind::Assignment(
            Box::new(folder.fold_expression(*target)),
            op,
            Box::new(folder.fold_expression(*value)),
        ),
        ExpressionKind::Conditional(test, consequent, alternate) => ExpressionKind::Conditional(
            Box::new(folder.fold_expression(*test)),
            Box::new(folder.fold_expression(*consequent)),
            Box::new(folder.fold_expression(*alternate)),
        ),
        ExpressionKind::Call(callee, arguments) => ExpressionKind::Call(
            Box::new(folder.fold_expression(*callee)),
            arguments
                .into_iter()
                .map(|argument| folder.fold_expression(argument))
                .collect(),
        ),
        ExpressionKind::New(callee, arguments) => ExpressionKind::New(
            Box::new(folder.fold_expression(*callee)),
            arguments
                .into_iter()
                .map(|argument| folder.fold_expression(argument))
                .collect(),
        ),
        ExpressionKind::Member(object, property) => ExpressionKind::Member(
            Box::new(folder.fold_expression(*object)),
            folder.fold_property_name(property),
        ),
        ExpressionKind::Index(object, index) => ExpressionKind::Index(
            Box::new(folder.fold_expression(*object)),
            Box::new(folder.fold_expression(*index)),
        ),
        ExpressionKind::Sequence(expressions) => ExpressionKind::Sequence(
            expressions
                .into_iter()
                .map(|item| folder.fold_expression(item))
                .collect(),
        ),
        ExpressionKind::Parenthesized(inner) => {
            ExpressionKind::Parenthesized(Box::new(folder.fold_expression(*inner)))
        }
        leaf @ (ExpressionKind::Identifier(_) | ExpressionKind::Literal(_) | ExpressionKind::This) => {
            leaf
        }
    };
    Expression { id, kind, span }
}

pub fn walk_pattern<F: Fold>(folder: &mut F, pattern: Pattern) -> Pattern {
    match pattern {
        Pattern::Identifier(ident) => Pattern::Identifier(folder.fold_binding(ident)),
        Pattern::Object(object) => Pattern::Object(ObjectPattern {
            properties: object
                .properties
                .into_iter()
                .map(|property| ObjectPatternProperty {
                    key: walk_property_key(folder, property.key),
                    value: folder.fold_pattern(property.value),
                    default: property.default.map(|default| folder.fold_expression(default)),
                    span: property.span,
                })
                .collect(),
            rest: object.rest.map(|rest| folder.fold_binding(rest)),
            span: object.span,
        }),
        Pattern::Array(array) => Pattern::Array(ArrayPattern {
            elements: array
                .elements
                .into_iter()
                .map(|element| {
                    element.map(|element| ArrayPatternElement {
                        pattern: folder.fold_pattern(element.pattern),
                        default: element.default.map(|default| folder.fold_expression(default)),
                    })
                })
                .collect(),
            rest: array.rest.map(|rest| folder.fold_binding(rest)),
            span: array.span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    /// Counts every identifier the traversal reaches
    #[derive(Default)]
    struct Counter {
        references: usize,
        bindings: usize,
        properties: usize,
    }

    impl Fold for Counter {
        fn fold_expression(&mut self, expr: Expression) -> Expression {
            if expr.as_identifier().is_some() {
                self.references += 1;
            }
            walk_expression(self, expr)
        }

        fn fold_binding(&mut self, ident: Ident) -> Ident {
            self.bindings += 1;
            ident
        }

        fn fold_property_name(&mut self, ident: Ident) -> Ident {
            self.properties += 1;
            ident
        }
    }

    #[test]
    fn test_walk_reaches_every_identifier() {
        let program = parse_source(
            "function f(a, { b }) { const [c] = a; return b.x + c; }\nfor (const k in o) { g(k); }",
        )
        .unwrap();
        let mut counter = Counter::default();
        let folded = counter.fold_program(program.clone());

        assert_eq!(folded, program);
        // f, a, b, c, k
        assert_eq!(counter.bindings, 5);
        // a, b, c, o, g, k
        assert_eq!(counter.references, 6);
        // pattern key `b`, member `x`
        assert_eq!(counter.properties, 2);
    }

    #[test]
    fn test_statement_expansion_in_single_statement_position() {
        struct Duplicate;
        impl Fold for Duplicate {
            fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
                match statement {
                    Statement::Expression(expr) => {
                        vec![Statement::Expression(expr.clone()), Statement::Expression(expr)]
                    }
                    other => walk_statement(self, other),
                }
            }
        }

        let program = parse_source("if (x) f();").unwrap();
        let folded = Duplicate.fold_program(program);
        match &folded.statements[0] {
            Statement::If(stmt) => match stmt.consequent.as_ref() {
                Statement::Block(block) => assert_eq!(block.statements.len(), 2),
                other => panic!("Expected block, got {:?}", other),
            },
            other => panic!("Expected if, got {:?}", other),
        }
    }
}
