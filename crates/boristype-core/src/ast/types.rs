use crate::span::Span;

/// Type annotation, reduced to what lowering decisions need.
///
/// Annotations are erased from the output; they only feed the declaration-based
/// type oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// `T[]`
    Array(Box<TypeAnnotation>),
    /// `[A, B]`
    Tuple(Vec<TypeAnnotation>),
    String,
    Number,
    Boolean,
    /// `Name` or `Name<Args>`
    Named(String, Vec<TypeAnnotation>),
    Union(Vec<TypeAnnotation>),
    /// `(a: A) => R`
    Function(Box<TypeAnnotation>),
    /// Anything else: object literal types, literal types, `any`, `unknown`, ...
    Other,
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        TypeAnnotation { kind, span }
    }
}
