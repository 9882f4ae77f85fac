pub mod expression;
pub mod pattern;
pub mod statement;
pub mod types;

use crate::span::Span;

/// Wrapper for AST nodes with span information
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }
}

/// Identifier
pub type Ident = Spanned<String>;

/// Identity of an expression node, assigned by the parser.
///
/// The type oracle answers per `NodeId`; nodes moved between trees keep their id,
/// so answers stay valid across passes. Nodes synthesized by a pass carry
/// [`NodeId::SYNTHETIC`] unless the pass allocates a fresh id to record a type for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub fn is_synthetic(self) -> bool {
        self == NodeId::SYNTHETIC
    }
}

/// A `/// @name` line found at the top level of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    XmlInit,
    Html,
    Other(String),
}

impl Directive {
    pub fn from_name(name: &str) -> Self {
        match name {
            "xml-init" => Directive::XmlInit,
            "html" => Directive::Html,
            other => Directive::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Directive::XmlInit => "xml-init",
            Directive::Html => "html",
            Directive::Other(name) => name,
        }
    }
}

/// Top-level program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<statement::Statement>,
    pub directives: Vec<Directive>,
    /// One past the highest `NodeId` handed out by the parser
    pub node_count: u32,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<statement::Statement>, span: Span) -> Self {
        Program {
            statements,
            directives: Vec::new(),
            node_count: 0,
            span,
        }
    }

    pub fn has_directive(&self, directive: &Directive) -> bool {
        self.directives.contains(directive)
    }
}

/// Formats a numeric literal the way the target dialect spells it
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(65535.0), "65535");
    }
}
