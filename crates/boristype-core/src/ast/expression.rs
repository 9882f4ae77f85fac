use super::{pattern::Pattern, statement::Block, types::TypeAnnotation, Ident, NodeId, Spanned};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Identifier(String),
    Literal(Literal),
    This,
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectProperty>),
    Function(FunctionExpression),
    Arrow(ArrowFunction),
    Template(TemplateLiteral),
    Unary(UnaryOp, Box<Expression>),
    Update(UpdateOp, UpdatePosition, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Assignment(Box<Expression>, AssignmentOp, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, Ident),
    Index(Box<Expression>, Box<Expression>),
    Sequence(Vec<Expression>),
    Parenthesized(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    NullishCoalesce,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    Instanceof,
    In,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalesce => "??",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::UnsignedShiftRight => ">>>",
            BinaryOp::Instanceof => "instanceof",
            BinaryOp::In => "in",
        }
    }

    /// Binding power, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::NullishCoalesce => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::BitwiseOr => 4,
            BinaryOp::BitwiseXor => 5,
            BinaryOp::BitwiseAnd => 6,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::StrictEqual
            | BinaryOp::StrictNotEqual => 7,
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual
            | BinaryOp::Instanceof
            | BinaryOp::In => 8,
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::UnsignedShiftRight => 9,
            BinaryOp::Add | BinaryOp::Subtract => 10,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 11,
            BinaryOp::Power => 12,
        }
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, BinaryOp::Power)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    BitwiseNot,
    Typeof,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Typeof => "typeof ",
            UnaryOp::Void => "void ",
            UnaryOp::Delete => "delete ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePosition {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,              // =
    AddAssign,           // +=
    SubtractAssign,      // -=
    MultiplyAssign,      // *=
    DivideAssign,        // /=
    ModuloAssign,        // %=
    PowerAssign,         // **=
    BitwiseAndAssign,    // &=
    BitwiseOrAssign,     // |=
    BitwiseXorAssign,    // ^=
    LeftShiftAssign,     // <<=
    RightShiftAssign,    // >>=
    UnsignedShiftAssign, // >>>=
    AndAssign,           // &&=
    OrAssign,            // ||=
    NullishAssign,       // ??=
}

impl AssignmentOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubtractAssign => "-=",
            AssignmentOp::MultiplyAssign => "*=",
            AssignmentOp::DivideAssign => "/=",
            AssignmentOp::ModuloAssign => "%=",
            AssignmentOp::PowerAssign => "**=",
            AssignmentOp::BitwiseAndAssign => "&=",
            AssignmentOp::BitwiseOrAssign => "|=",
            AssignmentOp::BitwiseXorAssign => "^=",
            AssignmentOp::LeftShiftAssign => "<<=",
            AssignmentOp::RightShiftAssign => ">>=",
            AssignmentOp::UnsignedShiftAssign => ">>>=",
            AssignmentOp::AndAssign => "&&=",
            AssignmentOp::OrAssign => "||=",
            AssignmentOp::NullishAssign => "??=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expression(Expression),
    Spread(Expression),
    Hole,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(Ident),
    String(String),
    Number(f64),
}

impl PropertyKey {
    /// The key as the property name it denotes at run time
    pub fn name(&self) -> String {
        match self {
            PropertyKey::Identifier(ident) => ident.node.clone(),
            PropertyKey::String(value) => value.clone(),
            PropertyKey::Number(value) => super::format_number(*value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Property {
        key: PropertyKey,
        value: Expression,
        span: Span,
    },
    Shorthand(Ident),
    Method {
        key: PropertyKey,
        function: FunctionExpression,
        span: Span,
    },
    Spread {
        value: Expression,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub pattern: Pattern,
    pub type_annotation: Option<TypeAnnotation>,
    pub default: Option<Expression>,
    pub span: Span,
}

impl Parameter {
    pub fn identifier(name: Ident) -> Self {
        let span = name.span;
        Parameter {
            pattern: Pattern::Identifier(name),
            type_annotation: None,
            default: None,
            span,
        }
    }

    /// The parameter's name when it binds a single identifier
    pub fn name(&self) -> Option<&str> {
        match &self.pattern {
            Pattern::Identifier(ident) => Some(&ident.node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub name: Option<Ident>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: ArrowBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expression(Box<Expression>),
    Block(Block),
}

/// `quasis` always holds one more chunk than `expressions`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteral {
    pub quasis: Vec<String>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

// Constructors for synthesized nodes
impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Expression {
            id: NodeId::SYNTHETIC,
            kind,
            span,
        }
    }

    pub fn with_id(id: NodeId, kind: ExpressionKind, span: Span) -> Self {
        Expression { id, kind, span }
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Expression::new(ExpressionKind::Identifier(name.into()), span)
    }

    pub fn undefined(span: Span) -> Self {
        Expression::identifier("undefined", span)
    }

    pub fn null(span: Span) -> Self {
        Expression::new(ExpressionKind::Literal(Literal::Null), span)
    }

    pub fn boolean(value: bool, span: Span) -> Self {
        Expression::new(ExpressionKind::Literal(Literal::Boolean(value)), span)
    }

    pub fn number(value: f64, span: Span) -> Self {
        Expression::new(ExpressionKind::Literal(Literal::Number(value)), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Expression::new(ExpressionKind::Literal(Literal::String(value.into())), span)
    }

    pub fn array(elements: Vec<Expression>, span: Span) -> Self {
        Expression::new(
            ExpressionKind::Array(elements.into_iter().map(ArrayElement::Expression).collect()),
            span,
        )
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>, span: Span) -> Self {
        Expression::new(ExpressionKind::Call(Box::new(callee), arguments), span)
    }

    /// `callee(arguments)` where `callee` is a plain function name
    pub fn call_named(callee: &str, arguments: Vec<Expression>, span: Span) -> Self {
        Expression::call(Expression::identifier(callee, span), arguments, span)
    }

    pub fn member(object: Expression, property: impl Into<String>, span: Span) -> Self {
        Expression::new(
            ExpressionKind::Member(Box::new(object), Spanned::new(property.into(), span)),
            span,
        )
    }

    pub fn method_call(
        object: Expression,
        method: &str,
        arguments: Vec<Expression>,
        span: Span,
    ) -> Self {
        Expression::call(Expression::member(object, method, span), arguments, span)
    }

    pub fn index(object: Expression, index: Expression, span: Span) -> Self {
        Expression::new(ExpressionKind::Index(Box::new(object), Box::new(index)), span)
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression, span: Span) -> Self {
        Expression::new(ExpressionKind::Binary(op, Box::new(left), Box::new(right)), span)
    }

    pub fn unary(op: UnaryOp, operand: Expression, span: Span) -> Self {
        Expression::new(ExpressionKind::Unary(op, Box::new(operand)), span)
    }

    pub fn assign(target: Expression, value: Expression, span: Span) -> Self {
        Expression::new(
            ExpressionKind::Assignment(Box::new(target), AssignmentOp::Assign, Box::new(value)),
            span,
        )
    }

    pub fn conditional(test: Expression, then: Expression, otherwise: Expression, span: Span) -> Self {
        Expression::new(
            ExpressionKind::Conditional(Box::new(test), Box::new(then), Box::new(otherwise)),
            span,
        )
    }

    pub fn update(op: UpdateOp, position: UpdatePosition, target: Expression, span: Span) -> Self {
        Expression::new(ExpressionKind::Update(op, position, Box::new(target)), span)
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.as_identifier() == Some(name)
    }

    /// Identifiers, `this` and property reads on them. Re-evaluating one of these has no side effects.
    pub fn is_simple_reference(&self) -> bool {
        match &self.kind {
            ExpressionKind::Identifier(_) | ExpressionKind::This => true,
            ExpressionKind::Member(object, _) => object.is_simple_reference(),
            ExpressionKind::Parenthesized(inner) => inner.is_simple_reference(),
            _ => false,
        }
    }

    /// `object.method` when this is a method call, with the call arguments
    pub fn as_method_call(&self) -> Option<(&Expression, &str, &[Expression])> {
        match &self.kind {
            ExpressionKind::Call(callee, arguments) => match &callee.kind {
                ExpressionKind::Member(object, property) => {
                    Some((object, property.node.as_str(), arguments.as_slice()))
                }
                _ => None,
            },
            _ => None,
        }
    }
}
