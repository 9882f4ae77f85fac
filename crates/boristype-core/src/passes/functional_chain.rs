//! Array method chains to indexed loops.
//!
//! `const doubled = arr.filter(f).map(x => x * 2);` becomes one loop per supported
//! step, each accumulating into a temporary that the next step iterates over. Only
//! chains whose receiver is statically an array are touched.

use crate::ast::expression::{
    ArrayElement, ArrowBody, ArrowFunction, AssignmentOp, BinaryOp, Expression, ExpressionKind,
    FunctionExpression, ObjectProperty, Parameter, UnaryOp, UpdateOp, UpdatePosition,
};
use crate::ast::pattern::Pattern;
use crate::ast::statement::{
    Block, ForInit, ForStatement, IfStatement, ReturnStatement, Statement, VariableDeclaration,
    VariableDeclarator, VariableKind,
};
use crate::ast::{Ident, Program, Spanned};
use crate::pipeline::{LoweringPass, PassContext};
use crate::span::Span;
use crate::typeinfo::TypeCategory;
use crate::visit::{walk_expression, walk_statement, Fold};
use tracing::trace;

pub struct FunctionalChainLowering;

impl LoweringPass for FunctionalChainLowering {
    fn name(&self) -> &'static str {
        "functional-chain"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        ChainLowerer { ctx }.fold_program(program)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainMethod {
    Map,
    Filter,
    FlatMap,
    ForEach,
    Every,
    Some,
    Find,
    FindIndex,
    FindLast,
    FindLastIndex,
    Reduce,
    ReduceRight,
}

impl ChainMethod {
    fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "map" => ChainMethod::Map,
            "filter" => ChainMethod::Filter,
            "flatMap" => ChainMethod::FlatMap,
            "forEach" => ChainMethod::ForEach,
            "every" => ChainMethod::Every,
            "some" => ChainMethod::Some,
            "find" => ChainMethod::Find,
            "findIndex" => ChainMethod::FindIndex,
            "findLast" => ChainMethod::FindLast,
            "findLastIndex" => ChainMethod::FindLastIndex,
            "reduce" => ChainMethod::Reduce,
            "reduceRight" => ChainMethod::ReduceRight,
            _ => return None,
        };
        Some(method)
    }

    fn runs_backwards(self) -> bool {
        matches!(
            self,
            ChainMethod::FindLast | ChainMethod::FindLastIndex | ChainMethod::ReduceRight
        )
    }

    fn is_reduce(self) -> bool {
        matches!(self, ChainMethod::Reduce | ChainMethod::ReduceRight)
    }
}

/// Whether an expression is a chain this pass lowers
enum ChainShape<'e> {
    /// `root` is the receiver of the innermost supported method
    Chainable { root: &'e Expression },
    NotChainable,
}

fn classify<'e>(expr: &'e Expression, ctx: &PassContext<'_>) -> ChainShape<'e> {
    match innermost_receiver(expr) {
        Some(root) if ctx.type_of(root).is_array() => ChainShape::Chainable { root },
        _ => ChainShape::NotChainable,
    }
}

fn innermost_receiver(expr: &Expression) -> Option<&Expression> {
    match &expr.kind {
        ExpressionKind::Call(callee, _) => match &callee.kind {
            ExpressionKind::Member(object, method) => innermost_receiver(object).or_else(|| {
                ChainMethod::from_name(&method.node).map(|_| object.as_ref())
            }),
            _ => None,
        },
        ExpressionKind::Member(object, _) | ExpressionKind::Index(object, _) => innermost_receiver(object),
        ExpressionKind::Parenthesized(inner) => innermost_receiver(inner),
        _ => None,
    }
}

/// The variable a simple reference starts from: `arr` for `arr` and `obj.items`
fn root_name(expr: &Expression) -> Option<&str> {
    match &expr.kind {
        ExpressionKind::Identifier(name) => Some(name),
        ExpressionKind::Member(object, _) => root_name(object),
        ExpressionKind::Parenthesized(inner) => root_name(inner),
        _ => None,
    }
}

/// How the body of a step calls back into user code
enum Callback {
    /// Function literal whose body is spliced into the loop
    Inline {
        parameters: Vec<Parameter>,
        statements: Vec<Statement>,
        result: Option<Expression>,
    },
    /// Anything else, called once per element
    Call(Expression),
    Missing,
}

impl Callback {
    /// Whether splicing the callback into a loop body declares `name` there
    fn declares(&self, name: &str) -> bool {
        let Callback::Inline {
            parameters,
            statements,
            result,
        } = self
        else {
            return false;
        };

        let in_parameters = parameters
            .iter()
            .any(|parameter| parameter.pattern.bound_names().iter().any(|ident| ident.node == name));
        if in_parameters {
            return true;
        }

        let mut finder = BindingFinder { name, found: false };
        finder.fold_statements(statements.clone());
        if let Some(result) = result {
            finder.fold_expression(result.clone());
        }
        finder.found
    }
}

/// Looks for a declaration of one name, outside nested functions
struct BindingFinder<'n> {
    name: &'n str,
    found: bool,
}

impl Fold for BindingFinder<'_> {
    fn fold_binding(&mut self, ident: Ident) -> Ident {
        if ident.node == self.name {
            self.found = true;
        }
        ident
    }

    fn fold_expression(&mut self, expr: Expression) -> Expression {
        match &expr.kind {
            ExpressionKind::Arrow(_) | ExpressionKind::Function(_) => expr,
            _ => walk_expression(self, expr),
        }
    }

    fn fold_function_body(&mut self, parameters: Vec<Parameter>, body: Block) -> (Vec<Parameter>, Block) {
        (parameters, body)
    }
}

struct ChainLowerer<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for ChainLowerer<'_, '_> {
    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        let mut hoisted = Vec::new();
        let statement = self.lower_statement(statement, &mut hoisted);

        if hoisted.is_empty() {
            return statement.map(|s| walk_statement(self, s)).unwrap_or_default();
        }

        hoisted.extend(statement);
        let mut result = Vec::with_capacity(hoisted.len());
        for statement in hoisted {
            result.extend(walk_statement(self, statement));
        }
        result
    }
}

impl ChainLowerer<'_, '_> {
    /// Lowers chains in the positions that may host them. Returns `None` when the
    /// statement only computed a chain whose value nobody reads.
    fn lower_statement(&mut self, statement: Statement, out: &mut Vec<Statement>) -> Option<Statement> {
        match statement {
            Statement::Variable(mut declaration) if declaration.declarators.len() == 1 => {
                let declarator = &mut declaration.declarators[0];
                if let Some(initializer) = declarator.initializer.take() {
                    let prefix = match &declarator.pattern {
                        Pattern::Identifier(name) => format!("temp_{}", name.node),
                        _ => "temp".to_string(),
                    };
                    declarator.initializer = Some(self.lower_in(initializer, &prefix, out));
                }
                Some(Statement::Variable(declaration))
            }
            Statement::Expression(expr) => {
                let Expression { id, kind, span } = expr;
                match kind {
                    ExpressionKind::Assignment(target, AssignmentOp::Assign, value) => {
                        let prefix = match target.as_identifier() {
                            Some(name) => format!("temp_{}", name),
                            None => "temp".to_string(),
                        };
                        let value = self.lower_in(*value, &prefix, out);
                        Some(Statement::Expression(Expression::with_id(
                            id,
                            ExpressionKind::Assignment(target, AssignmentOp::Assign, Box::new(value)),
                            span,
                        )))
                    }
                    kind => {
                        let expr = self.lower_in(Expression::with_id(id, kind, span), "temp", out);
                        let unused = matches!(
                            expr.kind,
                            ExpressionKind::Identifier(_) | ExpressionKind::Literal(_)
                        );
                        if !out.is_empty() && unused {
                            None
                        } else {
                            Some(Statement::Expression(expr))
                        }
                    }
                }
            }
            Statement::Return(ReturnStatement {
                argument: Some(argument),
                span,
            }) => {
                let argument = self.lower_in(argument, "temp_return", out);
                Some(Statement::Return(ReturnStatement {
                    argument: Some(argument),
                    span,
                }))
            }
            other => Some(other),
        }
    }

    /// Lowers every chain reachable through call arguments and literal elements,
    /// in evaluation order
    fn lower_in(&mut self, expr: Expression, prefix: &str, out: &mut Vec<Statement>) -> Expression {
        if let ChainShape::Chainable { root } = classify(&expr, self.ctx) {
            trace!(root_span = %root.span, "lowering method chain");
            return self.lower_chain(expr, prefix, out);
        }

        let Expression { id, kind, span } = expr;
        let kind = match kind {
            ExpressionKind::Call(callee, arguments) => {
                let callee = self.lower_in(*callee, prefix, out);
                let arguments = arguments
                    .into_iter()
                    .map(|argument| self.lower_in(argument, prefix, out))
                    .collect();
                ExpressionKind::Call(Box::new(callee), arguments)
            }
            ExpressionKind::Array(elements) => ExpressionKind::Array(
                elements
                    .into_iter()
                    .map(|element| match element {
                        ArrayElement::Expression(value) => {
                            ArrayElement::Expression(self.lower_in(value, prefix, out))
                        }
                        ArrayElement::Spread(source) => {
                            ArrayElement::Spread(self.lower_in(source, prefix, out))
                        }
                        ArrayElement::Hole => ArrayElement::Hole,
                    })
                    .collect(),
            ),
            ExpressionKind::Object(properties) => ExpressionKind::Object(
                properties
                    .into_iter()
                    .map(|property| match property {
                        ObjectProperty::Property { key, value, span } => ObjectProperty::Property {
                            key,
                            value: self.lower_in(value, prefix, out),
                            span,
                        },
                        ObjectProperty::Spread { value, span } => ObjectProperty::Spread {
                            value: self.lower_in(value, prefix, out),
                            span,
                        },
                        other => other,
                    })
                    .collect(),
            ),
            ExpressionKind::Parenthesized(inner) => {
                ExpressionKind::Parenthesized(Box::new(self.lower_in(*inner, prefix, out)))
            }
            other => other,
        };
        Expression::with_id(id, kind, span)
    }

    /// Rebuilds a chain innermost step first, replacing each supported step with a loop
    fn lower_chain(&mut self, expr: Expression, prefix: &str, out: &mut Vec<Statement>) -> Expression {
        let Expression { id, kind, span } = expr;
        match kind {
            ExpressionKind::Call(callee, arguments) => {
                let Expression {
                    id: callee_id,
                    kind: callee_kind,
                    span: callee_span,
                } = *callee;
                match callee_kind {
                    ExpressionKind::Member(object, method) => {
                        let base = self.lower_chain(*object, prefix, out);
                        match ChainMethod::from_name(&method.node) {
                            Some(step) if self.ctx.type_of(&base).is_array() => {
                                self.lower_step(step, base, arguments, prefix, span, out)
                            }
                            _ => {
                                let callee = Expression::with_id(
                                    callee_id,
                                    ExpressionKind::Member(Box::new(base), method),
                                    callee_span,
                                );
                                Expression::with_id(
                                    id,
                                    ExpressionKind::Call(Box::new(callee), arguments),
                                    span,
                                )
                            }
                        }
                    }
                    other => {
                        let callee = Expression::with_id(callee_id, other, callee_span);
                        Expression::with_id(id, ExpressionKind::Call(Box::new(callee), arguments), span)
                    }
                }
            }
            ExpressionKind::Member(object, property) => {
                let base = self.lower_chain(*object, prefix, out);
                Expression::with_id(id, ExpressionKind::Member(Box::new(base), property), span)
            }
            ExpressionKind::Index(object, index) => {
                let base = self.lower_chain(*object, prefix, out);
                Expression::with_id(id, ExpressionKind::Index(Box::new(base), index), span)
            }
            ExpressionKind::Parenthesized(inner) => {
                let inner = self.lower_chain(*inner, prefix, out);
                Expression::with_id(id, ExpressionKind::Parenthesized(Box::new(inner)), span)
            }
            other => Expression::with_id(id, other, span),
        }
    }

    /// Binds a base that is not a plain reference to a temporary so it is evaluated once
    fn ensure_simple(&mut self, base: Expression, prefix: &str, out: &mut Vec<Statement>) -> Expression {
        if base.is_simple_reference() {
            return base;
        }

        let suffix = base
            .as_method_call()
            .map(|(_, method, _)| method.to_string())
            .unwrap_or_else(|| "source".to_string());
        let name = self.ctx.fresh_name(&format!("{}_{}", prefix, suffix));
        let category = self.ctx.type_of(&base);
        self.ctx.record_name_type(&name, category);

        let span = base.span;
        out.push(Statement::declare(VariableKind::Const, name.clone(), Some(base), span));
        Expression::identifier(name, span)
    }

    fn alias_base(&mut self, base: Expression, root: &str, out: &mut Vec<Statement>) -> Expression {
        let name = self.ctx.fresh_name(root);
        let category = self.ctx.type_of(&base);
        self.ctx.record_name_type(&name, category);
        trace!(root, alias = %name, "callback shadows chain base");

        let span = base.span;
        out.push(Statement::declare(VariableKind::Const, name.clone(), Some(base), span));
        Expression::identifier(name, span)
    }

    fn lower_step(
        &mut self,
        step: ChainMethod,
        base: Expression,
        arguments: Vec<Expression>,
        prefix: &str,
        span: Span,
        out: &mut Vec<Statement>,
    ) -> Expression {
        let base = self.ensure_simple(base, prefix, out);
        let mut arguments = arguments.into_iter();
        let callback = self.prepare_callback(arguments.next(), prefix, out);
        let seed = arguments.next();

        // The loop reads the base after the callback body runs, so it must not be shadowed
        let root = root_name(&base).map(str::to_string);
        let base = match root {
            Some(root) if callback.declares(&root) => self.alias_base(base, &root, out),
            _ => base,
        };

        let index = self.ctx.fresh_name("i");
        let index_expr = Expression::identifier(index.clone(), span);
        let element = Expression::index(base.clone(), index_expr.clone(), span);

        let mut body = Vec::new();
        let result_expr;
        let accumulator;

        if step.is_reduce() {
            let name = self.ctx.fresh_name(prefix);
            let seed = seed.unwrap_or_else(|| Expression::undefined(span));
            let category = self.ctx.type_of(&seed);
            self.ctx.record_name_type(&name, category);
            out.push(Statement::declare(VariableKind::Let, name.clone(), Some(seed), span));

            let acc = Expression::identifier(name.clone(), span);
            let values = vec![acc.clone(), element.clone(), index_expr.clone(), base.clone()];
            let value = self.invoke(callback, values, 1, &mut body, span);
            body.push(Statement::assign(acc, value, span));
            accumulator = Some(name);
            result_expr = None;
        } else {
            let values = vec![element.clone(), index_expr.clone(), base.clone()];
            let value = self.invoke(callback, values, 0, &mut body, span);
            if step == ChainMethod::ForEach {
                if !matches!(&value.kind, ExpressionKind::Identifier(name) if name == "undefined") {
                    body.push(Statement::Expression(value));
                }
                accumulator = None;
                result_expr = None;
            } else {
                let result = self.ctx.fresh_name("result");
                body.push(Statement::declare(VariableKind::Const, result.clone(), Some(value), span));
                let (name, kind, seed) = match step {
                    ChainMethod::Map | ChainMethod::Filter | ChainMethod::FlatMap => {
                        (self.ctx.fresh_name(prefix), VariableKind::Const, Expression::array(Vec::new(), span))
                    }
                    ChainMethod::Every => (self.ctx.fresh_name(prefix), VariableKind::Let, Expression::boolean(true, span)),
                    ChainMethod::Some => (self.ctx.fresh_name(prefix), VariableKind::Let, Expression::boolean(false, span)),
                    ChainMethod::FindIndex | ChainMethod::FindLastIndex => {
                        (self.ctx.fresh_name(prefix), VariableKind::Let, Expression::number(-1.0, span))
                    }
                    _ => (self.ctx.fresh_name(prefix), VariableKind::Let, Expression::undefined(span)),
                };
                if matches!(step, ChainMethod::Map | ChainMethod::Filter | ChainMethod::FlatMap) {
                    self.ctx.record_name_type(&name, TypeCategory::Array);
                }
                out.push(Statement::declare(kind, name.clone(), Some(seed), span));
                body.push(self.accumulate(step, &name, &result, &element, &index_expr, span));
                accumulator = Some(name);
                result_expr = Some(result);
            }
        }

        trace!(?step, result = ?result_expr, "synthesized chain loop");
        out.push(indexed_loop(&index, base, step.runs_backwards(), body, span));

        match accumulator {
            Some(name) => Expression::identifier(name, span),
            None => Expression::undefined(span),
        }
    }

    /// The per-element statement that folds the callback result into the accumulator
    fn accumulate(
        &mut self,
        step: ChainMethod,
        accumulator: &str,
        result: &str,
        element: &Expression,
        index: &Expression,
        span: Span,
    ) -> Statement {
        let acc = Expression::identifier(accumulator, span);
        let result_ref = Expression::identifier(result, span);
        let push = |value: Expression| {
            Statement::Expression(Expression::method_call(acc.clone(), "push", vec![value], span))
        };
        let break_with = |value: Expression| {
            Statement::Block(Block::new(
                vec![Statement::assign(acc.clone(), value, span), Statement::Break(span)],
                span,
            ))
        };
        let when = |condition: Expression, then: Statement| {
            Statement::If(IfStatement {
                condition,
                consequent: Box::new(then),
                alternate: None,
                span,
            })
        };

        match step {
            ChainMethod::Map => push(result_ref),
            ChainMethod::Filter => when(
                result_ref,
                Statement::Block(Block::new(vec![push(element.clone())], span)),
            ),
            ChainMethod::FlatMap => {
                self.ctx.record_name_type(result, TypeCategory::Array);
                let inner = self.ctx.fresh_name("j");
                let item = Expression::index(
                    result_ref.clone(),
                    Expression::identifier(inner.clone(), span),
                    span,
                );
                indexed_loop(&inner, result_ref, false, vec![push(item)], span)
            }
            ChainMethod::Every => when(
                Expression::unary(UnaryOp::Not, result_ref, span),
                break_with(Expression::boolean(false, span)),
            ),
            ChainMethod::Some => when(result_ref, break_with(Expression::boolean(true, span))),
            ChainMethod::Find | ChainMethod::FindLast => {
                when(result_ref, break_with(element.clone()))
            }
            ChainMethod::FindIndex | ChainMethod::FindLastIndex => {
                when(result_ref, break_with(index.clone()))
            }
            ChainMethod::ForEach | ChainMethod::Reduce | ChainMethod::ReduceRight => {
                Statement::Empty(span)
            }
        }
    }

    fn prepare_callback(
        &mut self,
        callback: Option<Expression>,
        prefix: &str,
        out: &mut Vec<Statement>,
    ) -> Callback {
        let Some(callback) = callback else {
            return Callback::Missing;
        };

        let callback = match inline_callback(callback) {
            Ok(inline) => return inline,
            Err(callback) => callback,
        };

        if callback.is_simple_reference() {
            return Callback::Call(callback);
        }

        let name = self.ctx.fresh_name(&format!("{}_callback", prefix));
        let span = callback.span;
        out.push(Statement::declare(VariableKind::Const, name.clone(), Some(callback), span));
        Callback::Call(Expression::identifier(name, span))
    }

    /// Emits the callback's work into `body` and returns the expression holding its result
    fn invoke(
        &mut self,
        callback: Callback,
        values: Vec<Expression>,
        element_position: usize,
        body: &mut Vec<Statement>,
        span: Span,
    ) -> Expression {
        match callback {
            Callback::Inline {
                parameters,
                statements,
                result,
            } => {
                let mut values = values.into_iter();
                for parameter in parameters {
                    let value = values.next().unwrap_or_else(|| Expression::undefined(span));
                    body.push(Statement::Variable(VariableDeclaration {
                        kind: VariableKind::Const,
                        declarators: vec![VariableDeclarator {
                            pattern: parameter.pattern,
                            type_annotation: parameter.type_annotation,
                            initializer: Some(value),
                            span: parameter.span,
                        }],
                        span: parameter.span,
                    }));
                }
                body.extend(statements);
                result.unwrap_or_else(|| Expression::undefined(span))
            }
            Callback::Call(function) => Expression::call(function, values, span),
            // Without a callback a step sees the element itself
            Callback::Missing => values
                .into_iter()
                .nth(element_position)
                .unwrap_or_else(|| Expression::undefined(span)),
        }
    }
}

/// Splits a function literal into parameters, leading statements and result when
/// its body can be spliced into a loop unchanged
fn inline_callback(callback: Expression) -> Result<Callback, Expression> {
    let Expression { id, kind, span } = callback;
    match kind {
        ExpressionKind::Arrow(arrow) if parameters_inlinable(&arrow.parameters) => match arrow.body {
            ArrowBody::Expression(result) => Ok(Callback::Inline {
                parameters: arrow.parameters,
                statements: Vec::new(),
                result: Some(*result),
            }),
            ArrowBody::Block(block) => match split_trailing_return(block.statements) {
                Ok((statements, result)) => Ok(Callback::Inline {
                    parameters: arrow.parameters,
                    statements,
                    result,
                }),
                Err(statements) => Err(Expression::with_id(
                    id,
                    ExpressionKind::Arrow(ArrowFunction {
                        parameters: arrow.parameters,
                        return_type: arrow.return_type,
                        body: ArrowBody::Block(Block::new(statements, block.span)),
                        span: arrow.span,
                    }),
                    span,
                )),
            },
        },
        ExpressionKind::Function(function)
            if function.name.is_none()
                && parameters_inlinable(&function.parameters)
                && !uses_function_context(&function.body) =>
        {
            let block_span = function.body.span;
            match split_trailing_return(function.body.statements) {
                Ok((statements, result)) => Ok(Callback::Inline {
                    parameters: function.parameters,
                    statements,
                    result,
                }),
                Err(statements) => Err(Expression::with_id(
                    id,
                    ExpressionKind::Function(FunctionExpression {
                        name: function.name,
                        parameters: function.parameters,
                        return_type: function.return_type,
                        body: Block::new(statements, block_span),
                        span: function.span,
                    }),
                    span,
                )),
            }
        }
        other => Err(Expression::with_id(id, other, span)),
    }
}

fn parameters_inlinable(parameters: &[Parameter]) -> bool {
    parameters.iter().all(|parameter| parameter.default.is_none())
}

/// `(leading statements, trailing return value)` when the only `return` is the last statement
fn split_trailing_return(
    mut statements: Vec<Statement>,
) -> Result<(Vec<Statement>, Option<Expression>), Vec<Statement>> {
    let result = match statements.last() {
        Some(Statement::Return(_)) => match statements.pop() {
            Some(Statement::Return(ret)) => ret.argument,
            _ => None,
        },
        _ => None,
    };

    if statements.iter().any(contains_return) {
        if let Some(argument) = result {
            let span = argument.span;
            statements.push(Statement::Return(ReturnStatement {
                argument: Some(argument),
                span,
            }));
        }
        return Err(statements);
    }
    Ok((statements, result))
}

fn contains_return(statement: &Statement) -> bool {
    match statement {
        Statement::Return(_) => true,
        Statement::Block(block) => block.statements.iter().any(contains_return),
        Statement::If(stmt) => {
            contains_return(&stmt.consequent)
                || stmt.alternate.as_deref().is_some_and(contains_return)
        }
        Statement::For(stmt) => contains_return(&stmt.body),
        Statement::ForIn(stmt) => contains_return(&stmt.body),
        Statement::ForOf(stmt) => contains_return(&stmt.body),
        Statement::While(stmt) => contains_return(&stmt.body),
        Statement::DoWhile(stmt) => contains_return(&stmt.body),
        Statement::Switch(stmt) => stmt
            .cases
            .iter()
            .any(|case| case.consequent.iter().any(contains_return)),
        Statement::Try(stmt) => {
            stmt.block.statements.iter().any(contains_return)
                || stmt
                    .handler
                    .as_ref()
                    .is_some_and(|handler| handler.body.statements.iter().any(contains_return))
                || stmt
                    .finalizer
                    .as_ref()
                    .is_some_and(|block| block.statements.iter().any(contains_return))
        }
        _ => false,
    }
}

/// Whether a function body reads `this` or `arguments` of its own frame
fn uses_function_context(body: &Block) -> bool {
    let mut scan = ContextScan { found: false };
    scan.fold_block(body.clone());
    scan.found
}

struct ContextScan {
    found: bool,
}

impl Fold for ContextScan {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        match &expr.kind {
            ExpressionKind::This => {
                self.found = true;
                expr
            }
            ExpressionKind::Identifier(name) if name == "arguments" => {
                self.found = true;
                expr
            }
            // A nested function has its own `this`
            ExpressionKind::Function(_) => expr,
            _ => walk_expression(self, expr),
        }
    }
}

/// `for (let i = 0; i < base.length; i++)`, or counting down from `base.length - 1`
fn indexed_loop(
    index: &str,
    base: Expression,
    backwards: bool,
    body: Vec<Statement>,
    span: Span,
) -> Statement {
    let counter = Expression::identifier(index, span);
    let length = Expression::member(base, "length", span);

    let (start, test, op) = if backwards {
        (
            Expression::binary(BinaryOp::Subtract, length, Expression::number(1.0, span), span),
            Expression::binary(
                BinaryOp::GreaterThanOrEqual,
                counter.clone(),
                Expression::number(0.0, span),
                span,
            ),
            UpdateOp::Decrement,
        )
    } else {
        (
            Expression::number(0.0, span),
            Expression::binary(BinaryOp::LessThan, counter.clone(), length, span),
            UpdateOp::Increment,
        )
    };

    let body: Vec<Statement> = body
        .into_iter()
        .filter(|statement| !matches!(statement, Statement::Empty(_)))
        .collect();

    Statement::For(ForStatement {
        init: Some(ForInit::Variable(VariableDeclaration {
            kind: VariableKind::Let,
            declarators: vec![VariableDeclarator {
                pattern: Pattern::Identifier(Spanned::new(index.to_string(), span)),
                type_annotation: None,
                initializer: Some(start),
                span,
            }],
            span,
        })),
        test: Some(test),
        update: Some(Expression::update(op, UpdatePosition::Postfix, counter, span)),
        body: Box::new(Statement::Block(Block::new(body, span))),
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::lower_with;
    use indoc::indoc;

    fn lower(source: &str) -> String {
        lower_with(source, vec![Box::new(FunctionalChainLowering)])
    }

    #[test]
    fn test_map_becomes_loop() {
        let output = lower(indoc! {"
            const arr: number[] = [1, 2, 3];
            const doubled = arr.map(x => x * 2);
        "});
        assert_eq!(
            output,
            indoc! {"
                const arr = [1, 2, 3];
                const temp_doubled = [];
                for (let i = 0; i < arr.length; i++) {
                    const x = arr[i];
                    const result = x * 2;
                    temp_doubled.push(result);
                }
                const doubled = temp_doubled;
            "}
        );
    }

    #[test]
    fn test_unknown_receiver_untouched() {
        let output = lower("const doubled = data.map(x => x * 2);");
        assert!(output.starts_with("const doubled = data.map("));
        assert!(!output.contains("for ("));
    }

    #[test]
    fn test_chain_steps_feed_each_other() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const out = arr.filter(x => x > 1).map(x => x + 1);
        "});
        assert!(output.contains("const temp_out = [];"));
        assert!(output.contains("if (result) {\n        temp_out.push(arr[i]);\n    }"));
        assert!(output.contains("for (let i_1 = 0; i_1 < temp_out.length; i_1++)"));
        assert!(output.contains("temp_out_1.push(result_1);"));
        assert!(output.ends_with("const out = temp_out_1;\n"));
    }

    #[test]
    fn test_some_breaks_on_first_truthy() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const any = arr.some(x => x > 1);
        "});
        assert!(output.contains("let temp_any = false;"));
        assert!(output.contains("if (result) {\n        temp_any = true;\n        break;\n    }"));
    }

    #[test]
    fn test_every_flips_on_first_falsy() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const all = arr.every(x => x > 1);
        "});
        assert!(output.contains("let temp_all = true;"));
        assert!(output.contains("if (!result) {\n        temp_all = false;\n        break;\n    }"));
    }

    #[test]
    fn test_reduce_right_counts_down() {
        let output = lower(indoc! {"
            const nested = [[0, 1], [2, 3], [4, 5]];
            const flat = nested.reduceRight((acc, cur) => union(acc, cur), []);
        "});
        assert!(output.contains("let temp_flat = [];"));
        assert!(output.contains("for (let i = nested.length - 1; i >= 0; i--)"));
        assert!(output.contains("const acc = temp_flat;"));
        assert!(output.contains("const cur = nested[i];"));
        assert!(output.contains("temp_flat = union(acc, cur);"));
    }

    #[test]
    fn test_reduce_counts_up_with_spliced_statements() {
        let output = lower(indoc! {"
            const values = [1, 2, 3];
            const total = values.reduce((sum, value) => {
                const doubled = value * 2;
                return sum + doubled;
            }, 0);
        "});
        assert!(output.contains("let temp_total = 0;"));
        assert!(output.contains("for (let i = 0; i < values.length; i++)"));
        assert!(output.contains("const doubled = value * 2;\n    temp_total = sum + doubled;"));
    }

    #[test]
    fn test_find_last_index_seed_and_direction() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const at = arr.findLastIndex(x => x === 2);
        "});
        assert!(output.contains("let temp_at = -1;"));
        assert!(output.contains("i >= 0; i--"));
        assert!(output.contains("temp_at = i;"));
    }

    #[test]
    fn test_for_each_statement_disappears() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            arr.forEach(x => log(x));
        "});
        assert!(output.contains("log(x);"));
        assert!(!output.contains("undefined;"));
        assert!(!output.contains("forEach"));
    }

    #[test]
    fn test_flat_map_pushes_inner_elements() {
        let output = lower(indoc! {"
            const arr = [1, 2];
            const pairs = arr.flatMap(x => [x, x]);
        "});
        assert!(output.contains("for (let j = 0; j < result.length; j++) {"));
        assert!(output.contains("temp_pairs.push(result[j]);"));
    }

    #[test]
    fn test_callback_reference_is_called() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const out = arr.map(double);
        "});
        assert!(output.contains("const result = double(arr[i], i, arr);"));
    }

    #[test]
    fn test_non_chain_root_call_hoisted() {
        let output = lower(indoc! {"
            function load(): number[] { return []; }
            const out = load().map(x => x + 1);
        "});
        assert!(output.contains("const temp_out_source = load();"));
        assert!(output.contains("i < temp_out_source.length"));
    }

    #[test]
    fn test_unsupported_step_between_hoisted() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const out = arr.map(x => x).slice(1).filter(x => x);
        "});
        assert!(output.contains("const temp_out_slice = temp_out.slice(1);"));
        assert!(output.contains("i_1 < temp_out_slice.length"));
    }

    #[test]
    fn test_trailing_property_preserved() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const count = arr.filter(x => x > 1).length;
        "});
        assert!(output.ends_with("const count = temp_count.length;\n"));
    }

    #[test]
    fn test_nested_return_falls_back_to_call() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const out = arr.map(x => { if (x > 1) { return 1; } return 0; });
        "});
        assert!(output.contains("const temp_out_callback = "));
        assert!(output.contains("const result = temp_out_callback(arr[i], i, arr);"));
    }

    #[test]
    fn test_chain_inside_call_argument() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            print(arr.map(x => x + 1));
        "});
        assert!(output.ends_with("print(temp);\n"));
    }

    #[test]
    fn test_indexed_chain_result() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const first = arr.map(x => x * 2)[0];
        "});
        assert!(output.contains("temp_first.push(result);"));
        assert!(output.ends_with("const first = temp_first[0];\n"));
    }

    #[test]
    fn test_parameter_named_like_base_gets_alias() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const r = arr.map((v, i, arr) => v + arr.length);
        "});
        assert!(output.starts_with("const arr = [1, 2, 3];\nconst arr_1 = arr;\n"));
        assert!(output.contains("for (let i_1 = 0; i_1 < arr_1.length; i_1++) {"));
        assert!(output.contains("const v = arr_1[i_1];"));
        assert!(output.contains("const i = i_1;"));
        assert!(output.contains("const arr = arr_1;"));
    }

    #[test]
    fn test_filter_element_read_from_alias() {
        let output = lower(indoc! {"
            const xs = [1, 2, 3];
            const kept = xs.filter(xs => xs > 1);
        "});
        assert!(output.contains("const xs_1 = xs;"));
        assert!(output.contains("const xs = xs_1[i];"));
        assert!(output.contains("temp_kept.push(xs_1[i]);"));
    }

    #[test]
    fn test_body_local_named_like_base_gets_alias() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const big = arr.filter(x => { const arr = x * 2; return arr > 2; });
        "});
        assert!(output.contains("const arr_1 = arr;"));
        assert!(output.contains("i < arr_1.length"));
    }

    #[test]
    fn test_nested_function_parameter_needs_no_alias() {
        let output = lower(indoc! {"
            const arr = [1, 2, 3];
            const fns = arr.map(x => (arr) => arr + x);
        "});
        assert!(!output.contains("arr_1"));
        assert!(output.contains("i < arr.length"));
    }
}
