use super::{expression::Expression, expression::PropertyKey, Ident};
use crate::span::Span;

/// Binding pattern on the left of a declaration, a parameter or a loop head.
///
/// A rest target is held apart from the ordinary elements, so "at most one rest,
/// always last" holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Identifier(Ident),
    Object(ObjectPattern),
    Array(ArrayPattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    pub rest: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    pub key: PropertyKey,
    pub value: Pattern,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPattern {
    /// `None` marks a hole (`[a, , b]`)
    pub elements: Vec<Option<ArrayPatternElement>>,
    pub rest: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPatternElement {
    pub pattern: Pattern,
    pub default: Option<Expression>,
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(ident) => ident.span,
            Pattern::Object(object) => object.span,
            Pattern::Array(array) => array.span,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Pattern::Identifier(_))
    }

    /// Every name this pattern binds, in source order
    pub fn bound_names(&self) -> Vec<&Ident> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a Ident>) {
        match self {
            Pattern::Identifier(ident) => names.push(ident),
            Pattern::Object(object) => {
                for property in &object.properties {
                    property.value.collect_names(names);
                }
                if let Some(rest) = &object.rest {
                    names.push(rest);
                }
            }
            Pattern::Array(array) => {
                for element in array.elements.iter().flatten() {
                    element.pattern.collect_names(names);
                }
                if let Some(rest) = &array.rest {
                    names.push(rest);
                }
            }
        }
    }
}
