//! Block-scoped bindings to the target's function-scoped `var` model.
//!
//! Every `let`/`const` a loop declares (in its head or in any block of its body short
//! of a nested loop or function) is renamed `name_loop<N>`, where `N` numbers loops in
//! file order. The renamed variables are pre-declared once, right before the
//! enclosing top-level loop, and each declaration inside the loop becomes an
//! assignment. Outside loops `let` and `const` become `var`, and a nested block
//! that shadows a visible name declares a fresh one instead.

use crate::ast::expression::{Expression, ExpressionKind, ObjectProperty, Parameter, PropertyKey};
use crate::ast::pattern::Pattern;
use crate::ast::statement::{
    Block, CatchClause, ExportKind, ForHead, ForInStatement, ForInit, ForOfStatement, ForStatement, Statement,
    SwitchCase, SwitchStatement, TryStatement, VariableDeclaration, VariableDeclarator, VariableKind,
};
use crate::ast::{Ident, Program};
use crate::pipeline::{LoweringPass, PassContext};
use crate::span::Span;
use crate::visit::{
    fold_nested, walk_block, walk_expression, walk_parameter, walk_statement, walk_variable_declaration,
    Fold,
};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

pub struct LoopScopeLowering;

impl LoweringPass for LoopScopeLowering {
    fn name(&self) -> &'static str {
        "loop-scope"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        let mut top_level = FxHashSet::default();
        function_scope_names(&program.statements, true, &mut top_level);

        let mut hoister = Hoister {
            ctx,
            next_loop: 1,
            loops: Vec::new(),
            pending: IndexMap::new(),
            scopes: vec![Scope::Function(top_level)],
        };
        hoister.fold_program(program)
    }
}

/// One level of name resolution
enum Scope {
    /// Names a function (or the file) binds for its whole body; never renamed
    Function(FxHashSet<String>),
    /// Original name to hoisted name, for the names one loop head declares
    Loop(FxHashMap<String, String>),
    /// Original name to emitted name, for the names one nested block declares
    Block(FxHashMap<String, String>),
}

struct Hoister<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
    next_loop: usize,
    /// Ids of the loops enclosing the current statement within the current function
    loops: Vec<usize>,
    /// Hoisted names awaiting their pre-declaration before the current top-level loop
    pending: IndexMap<String, VariableKind>,
    scopes: Vec<Scope>,
}

impl Fold for Hoister<'_, '_> {
    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        if statement.is_loop() {
            let top_level = self.loops.is_empty();
            let lowered = self.lower_loop(statement);
            if !top_level {
                return vec![lowered];
            }

            let span = lowered.span();
            let mut result: Vec<Statement> = self
                .pending
                .drain(..)
                .map(|(name, kind)| predeclaration(name, kind, span))
                .collect();
            result.push(lowered);
            return result;
        }

        match statement {
            Statement::Variable(declaration) if declaration.kind.is_block_scoped() => {
                if self.loops.is_empty() {
                    let mut declaration = walk_variable_declaration(self, declaration);
                    declaration.kind = VariableKind::Var;
                    vec![Statement::Variable(declaration)]
                } else {
                    self.declaration_to_assignments(declaration)
                }
            }
            Statement::Switch(stmt) => vec![Statement::Switch(self.lower_switch(stmt))],
            Statement::Try(stmt) => vec![Statement::Try(self.lower_try(stmt))],
            other => walk_statement(self, other),
        }
    }

    fn fold_block(&mut self, block: Block) -> Block {
        self.enter_block(lexical_names(&block.statements));
        let block = walk_block(self, block);
        self.scopes.pop();
        block
    }

    fn fold_expression(&mut self, expr: Expression) -> Expression {
        let Expression { id, kind, span } = expr;
        match kind {
            ExpressionKind::Identifier(name) => {
                let name = self.resolve(&name).unwrap_or(name);
                Expression::with_id(id, ExpressionKind::Identifier(name), span)
            }
            ExpressionKind::Object(properties) => {
                let properties = properties
                    .into_iter()
                    .map(|property| match property {
                        ObjectProperty::Shorthand(ident) => match self.resolve(&ident.node) {
                            Some(renamed) if renamed != ident.node => ObjectProperty::Property {
                                value: Expression::identifier(renamed, ident.span),
                                span: ident.span,
                                key: PropertyKey::Identifier(ident),
                            },
                            _ => ObjectProperty::Shorthand(ident),
                        },
                        other => other,
                    })
                    .collect();
                walk_expression(self, Expression::with_id(id, ExpressionKind::Object(properties), span))
            }
            kind => walk_expression(self, Expression::with_id(id, kind, span)),
        }
    }

    fn fold_binding(&mut self, ident: Ident) -> Ident {
        match self.resolve(&ident.node) {
            Some(renamed) => Ident::new(renamed, ident.span),
            None => ident,
        }
    }

    fn fold_function_body(&mut self, parameters: Vec<Parameter>, body: Block) -> (Vec<Parameter>, Block) {
        let mut bound = FxHashSet::default();
        for parameter in &parameters {
            for name in parameter.pattern.bound_names() {
                bound.insert(name.node.clone());
            }
        }
        function_scope_names(&body.statements, true, &mut bound);

        // Loops inside the function flush their pre-declarations into its body
        let pending = std::mem::take(&mut self.pending);
        let loops = std::mem::take(&mut self.loops);
        self.scopes.push(Scope::Function(bound));

        let parameters = parameters
            .into_iter()
            .map(|parameter| walk_parameter(self, parameter))
            .collect();
        let body = walk_block(self, body);

        self.scopes.pop();
        self.loops = loops;
        self.pending = pending;
        (parameters, body)
    }
}

impl Hoister<'_, '_> {
    /// The name `name` is emitted as at this point, if some enclosing block or loop declares it
    fn resolve(&self, name: &str) -> Option<String> {
        for scope in self.scopes.iter().rev() {
            match scope {
                Scope::Loop(renames) | Scope::Block(renames) => {
                    if let Some(renamed) = renames.get(name) {
                        return Some(renamed.clone());
                    }
                }
                Scope::Function(bound) => {
                    if bound.contains(name) {
                        return None;
                    }
                }
            }
        }
        None
    }

    /// Whether any enclosing scope, across function boundaries, binds `name`
    fn is_visible(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| match scope {
            Scope::Function(bound) => bound.contains(name),
            Scope::Loop(renames) | Scope::Block(renames) => renames.contains_key(name),
        })
    }

    /// Opens a block scope for `names`. Inside a loop every name is hoisted; outside,
    /// only names that would capture an outer binding are renamed.
    fn enter_block(&mut self, names: IndexMap<String, VariableKind>) {
        let mut renames = FxHashMap::default();
        for (name, kind) in names {
            let emitted = match self.loops.last().copied() {
                Some(loop_id) => {
                    let renamed = self.ctx.fresh_name(&format!("{}_loop{}", name, loop_id));
                    trace!(from = %name, to = %renamed, "hoisting loop binding");
                    self.pending.entry(renamed.clone()).or_insert(kind);
                    renamed
                }
                None if self.is_visible(&name) => {
                    let renamed = self.ctx.fresh_name(&name);
                    trace!(from = %name, to = %renamed, "renaming shadowing binding");
                    renamed
                }
                None => name.clone(),
            };
            renames.insert(name, emitted);
        }
        self.scopes.push(Scope::Block(renames));
    }

    fn lower_loop(&mut self, statement: Statement) -> Statement {
        let id = self.next_loop;
        self.next_loop += 1;

        let mut declared = IndexMap::new();
        loop_head_names(&statement, &mut declared);

        let mut renames = FxHashMap::default();
        for (name, kind) in declared {
            let renamed = self.ctx.fresh_name(&format!("{}_loop{}", name, id));
            trace!(from = %name, to = %renamed, "hoisting loop binding");
            self.pending.entry(renamed.clone()).or_insert(kind);
            renames.insert(name, renamed);
        }
        debug!(loop_id = id, renamed = renames.len(), "lowering loop scope");

        self.scopes.push(Scope::Loop(renames));
        self.loops.push(id);
        let lowered = self.walk_loop(statement);
        self.loops.pop();
        self.scopes.pop();
        lowered
    }

    /// All cases of a switch share one block scope; the discriminant sits outside it
    fn lower_switch(&mut self, stmt: SwitchStatement) -> SwitchStatement {
        let discriminant = self.fold_expression(stmt.discriminant);
        self.enter_block(lexical_names(stmt.cases.iter().flat_map(|case| &case.consequent)));
        let cases = stmt
            .cases
            .into_iter()
            .map(|case| SwitchCase {
                test: case.test.map(|test| self.fold_expression(test)),
                consequent: self.fold_statements(case.consequent),
                span: case.span,
            })
            .collect();
        self.scopes.pop();
        SwitchStatement {
            discriminant,
            cases,
            span: stmt.span,
        }
    }

    /// The catch parameter is visible in the handler body only
    fn lower_try(&mut self, stmt: TryStatement) -> TryStatement {
        let block = self.fold_block(stmt.block);
        let handler = stmt.handler.map(|handler| {
            let mut bound = FxHashMap::default();
            if let Some(parameter) = &handler.parameter {
                bound.insert(parameter.node.clone(), parameter.node.clone());
            }
            self.scopes.push(Scope::Block(bound));
            let body = self.fold_block(handler.body);
            self.scopes.pop();
            CatchClause {
                parameter: handler.parameter,
                body,
                span: handler.span,
            }
        });
        TryStatement {
            block,
            handler,
            finalizer: stmt.finalizer.map(|finalizer| self.fold_block(finalizer)),
            span: stmt.span,
        }
    }

    fn walk_loop(&mut self, statement: Statement) -> Statement {
        match statement {
            Statement::For(stmt) => {
                let init = stmt.init.map(|init| match init {
                    ForInit::Variable(declaration)
                        if declaration.kind.is_block_scoped()
                            && declaration.declarators.iter().all(|d| d.pattern.is_identifier()) =>
                    {
                        let span = declaration.span;
                        let mut assignments: Vec<Expression> = self
                            .declaration_to_assignments(declaration)
                            .into_iter()
                            .filter_map(|statement| match statement {
                                Statement::Expression(expr) => Some(expr),
                                _ => None,
                            })
                            .collect();
                        if assignments.len() == 1 {
                            ForInit::Expression(assignments.remove(0))
                        } else {
                            ForInit::Expression(Expression::new(ExpressionKind::Sequence(assignments), span))
                        }
                    }
                    ForInit::Variable(mut declaration) => {
                        if declaration.kind.is_block_scoped() {
                            declaration.kind = VariableKind::Var;
                        }
                        ForInit::Variable(walk_variable_declaration(self, declaration))
                    }
                    ForInit::Expression(expr) => ForInit::Expression(self.fold_expression(expr)),
                });
                Statement::For(ForStatement {
                    init,
                    test: stmt.test.map(|test| self.fold_expression(test)),
                    update: stmt.update.map(|update| self.fold_expression(update)),
                    body: fold_nested(self, stmt.body),
                    span: stmt.span,
                })
            }
            Statement::ForIn(stmt) => Statement::ForIn(ForInStatement {
                head: self.lower_head(stmt.head),
                object: self.fold_expression(stmt.object),
                body: fold_nested(self, stmt.body),
                span: stmt.span,
            }),
            Statement::ForOf(stmt) => Statement::ForOf(ForOfStatement {
                head: self.lower_head(stmt.head),
                iterable: self.fold_expression(stmt.iterable),
                body: fold_nested(self, stmt.body),
                span: stmt.span,
            }),
            other => {
                let span = other.span();
                Statement::from_statements(walk_statement(self, other), span)
            }
        }
    }

    /// `for (let k in o)` assigns the hoisted `k` instead of declaring it
    fn lower_head(&mut self, head: ForHead) -> ForHead {
        match head {
            ForHead::Declaration {
                kind,
                pattern: Pattern::Identifier(ident),
                span,
            } if kind.is_block_scoped() => {
                let name = self.resolve(&ident.node).unwrap_or(ident.node);
                ForHead::Target(Expression::identifier(name, span))
            }
            ForHead::Declaration { kind, pattern, span } => ForHead::Declaration {
                kind,
                pattern: self.fold_pattern(pattern),
                span,
            },
            ForHead::Target(target) => ForHead::Target(self.fold_expression(target)),
        }
    }

    /// `let x = 1, y;` inside a loop as `x_loop1 = 1; y_loop1 = undefined;`. Bindings
    /// that are still patterns stay declarations, renamed and function scoped.
    fn declaration_to_assignments(&mut self, declaration: VariableDeclaration) -> Vec<Statement> {
        let mut result = Vec::with_capacity(declaration.declarators.len());
        for declarator in declaration.declarators {
            let span = declarator.span;
            match declarator.pattern {
                Pattern::Identifier(ident) => {
                    let name = self.resolve(&ident.node).unwrap_or(ident.node);
                    let value = match declarator.initializer {
                        Some(initializer) => self.fold_expression(initializer),
                        None => Expression::undefined(span),
                    };
                    result.push(Statement::assign(Expression::identifier(name, ident.span), value, span));
                }
                pattern => {
                    let declaration = walk_variable_declaration(
                        self,
                        VariableDeclaration {
                            kind: VariableKind::Var,
                            declarators: vec![VariableDeclarator {
                                pattern,
                                type_annotation: declarator.type_annotation,
                                initializer: declarator.initializer,
                                span,
                            }],
                            span,
                        },
                    );
                    result.push(Statement::Variable(declaration));
                }
            }
        }
        result
    }
}

/// `var name = null;` for hoisted constants, `var name = undefined;` otherwise
fn predeclaration(name: String, kind: VariableKind, span: Span) -> Statement {
    let sentinel = match kind {
        VariableKind::Const => Expression::null(span),
        _ => Expression::undefined(span),
    };
    Statement::declare(VariableKind::Var, name, Some(sentinel), span)
}

/// Block-scoped names a loop head declares
fn loop_head_names(statement: &Statement, names: &mut IndexMap<String, VariableKind>) {
    match statement {
        Statement::For(stmt) => {
            if let Some(ForInit::Variable(declaration)) = &stmt.init {
                declaration_names(declaration, names);
            }
        }
        Statement::ForIn(ForInStatement { head, .. }) | Statement::ForOf(ForOfStatement { head, .. }) => {
            if let ForHead::Declaration { kind, pattern, .. } = head {
                if kind.is_block_scoped() {
                    for ident in pattern.bound_names() {
                        names.entry(ident.node.clone()).or_insert(*kind);
                    }
                }
            }
        }
        _ => {}
    }
}

fn declaration_names(declaration: &VariableDeclaration, names: &mut IndexMap<String, VariableKind>) {
    if !declaration.kind.is_block_scoped() {
        return;
    }
    for declarator in &declaration.declarators {
        for ident in declarator.pattern.bound_names() {
            names.entry(ident.node.clone()).or_insert(declaration.kind);
        }
    }
}

/// `let`/`const` names declared directly in one block, in source order
fn lexical_names<'s>(statements: impl IntoIterator<Item = &'s Statement>) -> IndexMap<String, VariableKind> {
    let mut names = IndexMap::new();
    for statement in statements {
        if let Statement::Variable(declaration) = statement {
            declaration_names(declaration, &mut names);
        }
    }
    names
}

/// Names bound for a whole function body: parameters aside, every `var` and function
/// declaration at any block depth, plus the `let`/`const` of the body's top level
fn function_scope_names(statements: &[Statement], top_level: bool, bound: &mut FxHashSet<String>) {
    for statement in statements {
        function_scope_names_in(statement, top_level, bound);
    }
}

fn function_scope_names_in(statement: &Statement, top_level: bool, bound: &mut FxHashSet<String>) {
    let bind_declaration = |declaration: &VariableDeclaration, bound: &mut FxHashSet<String>| {
        if top_level || !declaration.kind.is_block_scoped() {
            for declarator in &declaration.declarators {
                bound.extend(declarator.pattern.bound_names().into_iter().map(|ident| ident.node.clone()));
            }
        }
    };

    match statement {
        Statement::Variable(declaration) => bind_declaration(declaration, bound),
        Statement::Function(function) => {
            bound.insert(function.name.node.clone());
        }
        Statement::Block(block) => function_scope_names(&block.statements, false, bound),
        Statement::If(stmt) => {
            function_scope_names_in(&stmt.consequent, false, bound);
            if let Some(alternate) = &stmt.alternate {
                function_scope_names_in(alternate, false, bound);
            }
        }
        Statement::For(stmt) => {
            if let Some(ForInit::Variable(declaration)) = &stmt.init {
                if !declaration.kind.is_block_scoped() {
                    bind_declaration(declaration, bound);
                }
            }
            function_scope_names_in(&stmt.body, false, bound);
        }
        Statement::ForIn(ForInStatement { head, body, .. })
        | Statement::ForOf(ForOfStatement { head, body, .. }) => {
            if let ForHead::Declaration { kind, pattern, .. } = head {
                if !kind.is_block_scoped() {
                    bound.extend(pattern.bound_names().into_iter().map(|ident| ident.node.clone()));
                }
            }
            function_scope_names_in(body, false, bound);
        }
        Statement::While(stmt) => function_scope_names_in(&stmt.body, false, bound),
        Statement::DoWhile(stmt) => function_scope_names_in(&stmt.body, false, bound),
        Statement::Switch(stmt) => {
            for statement in stmt.cases.iter().flat_map(|case| &case.consequent) {
                function_scope_names_in(statement, false, bound);
            }
        }
        Statement::Try(stmt) => {
            let blocks = std::iter::once(&stmt.block)
                .chain(stmt.handler.as_ref().map(|handler| &handler.body))
                .chain(stmt.finalizer.as_ref());
            for statement in blocks.flat_map(|block| &block.statements) {
                function_scope_names_in(statement, false, bound);
            }
        }
        Statement::Export(export) => {
            if let ExportKind::Declaration(inner) | ExportKind::DefaultDeclaration(inner) = &export.kind {
                function_scope_names_in(inner, top_level, bound);
            }
        }
        _ => {}
    }
}
