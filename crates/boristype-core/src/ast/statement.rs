use super::{
    expression::{Expression, Parameter},
    pattern::Pattern,
    types::TypeAnnotation,
    Ident, Spanned,
};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Variable(VariableDeclaration),
    Function(FunctionDeclaration),
    Expression(Expression),
    Block(Block),
    If(IfStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Switch(SwitchStatement),
    Try(TryStatement),
    Throw(ThrowStatement),
    Return(ReturnStatement),
    Break(Span),
    Continue(Span),
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    /// `;`, and type-only declarations erased by the parser
    Empty(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }

    pub fn is_block_scoped(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarators: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub pattern: Pattern,
    pub type_annotation: Option<TypeAnnotation>,
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Ident,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

/// Left-hand side of `for-in` / `for-of`
#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    Declaration {
        kind: VariableKind,
        pattern: Pattern,
        span: Span,
    },
    Target(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    pub head: ForHead,
    pub object: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStatement {
    pub head: ForHead,
    pub iterable: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub condition: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub parameter: Option<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    Default(Ident),
    Namespace(Ident),
    Named { imported: Ident, local: Ident },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDeclaration {
    pub kind: ExportKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    /// `export const x = ...`, `export function f() {}`
    Declaration(Box<Statement>),
    /// `export default function f() {}`
    DefaultDeclaration(Box<Statement>),
    /// `export default <expr>`
    DefaultExpression(Expression),
    /// `export { a, b as c }` with an optional `from "..."`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
    },
    /// `export * from "..."`, optionally `export * as ns from "..."`
    All {
        alias: Option<Ident>,
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Ident,
    pub exported: Ident,
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Variable(decl) => decl.span,
            Statement::Function(func) => func.span,
            Statement::Expression(expr) => expr.span,
            Statement::Block(block) => block.span,
            Statement::If(stmt) => stmt.span,
            Statement::For(stmt) => stmt.span,
            Statement::ForIn(stmt) => stmt.span,
            Statement::ForOf(stmt) => stmt.span,
            Statement::While(stmt) => stmt.span,
            Statement::DoWhile(stmt) => stmt.span,
            Statement::Switch(stmt) => stmt.span,
            Statement::Try(stmt) => stmt.span,
            Statement::Throw(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
            Statement::Break(span) | Statement::Continue(span) | Statement::Empty(span) => *span,
            Statement::Import(decl) => decl.span,
            Statement::Export(decl) => decl.span,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Statement::For(_)
                | Statement::ForIn(_)
                | Statement::ForOf(_)
                | Statement::While(_)
                | Statement::DoWhile(_)
        )
    }

    /// `kind name = initializer;`
    pub fn declare(
        kind: VariableKind,
        name: impl Into<String>,
        initializer: Option<Expression>,
        span: Span,
    ) -> Statement {
        Statement::Variable(VariableDeclaration {
            kind,
            declarators: vec![VariableDeclarator {
                pattern: Pattern::Identifier(Spanned::new(name.into(), span)),
                type_annotation: None,
                initializer,
                span,
            }],
            span,
        })
    }

    /// `target = value;`
    pub fn assign(target: Expression, value: Expression, span: Span) -> Statement {
        Statement::Expression(Expression::assign(target, value, span))
    }

    /// Wraps several statements for a position that holds exactly one
    pub fn from_statements(mut statements: Vec<Statement>, span: Span) -> Statement {
        if statements.len() == 1 {
            if let Some(statement) = statements.pop() {
                return statement;
            }
        }
        Statement::Block(Block { statements, span })
    }

    /// The statements of a loop or branch body, unwrapping a block
    pub fn into_statements(self) -> Vec<Statement> {
        match self {
            Statement::Block(block) => block.statements,
            Statement::Empty(_) => Vec::new(),
            other => vec![other],
        }
    }
}

impl Block {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Block { statements, span }
    }
}
