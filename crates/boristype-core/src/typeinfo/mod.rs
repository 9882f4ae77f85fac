//! Static type answers consumed by the lowering passes.
//!
//! The passes only ever need to know whether an expression is an array, a string,
//! or something they must leave alone. [`DeclaredTypes`] derives those answers from
//! annotations and initializers; any other [`TypeOracle`] can be plugged in instead.

mod inference;

pub use inference::DeclaredTypes;

use crate::ast::expression::Expression;

/// What the lowering passes need to know about an expression's static type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Array,
    String,
    Unknown,
}

impl TypeCategory {
    pub fn is_array(self) -> bool {
        self == TypeCategory::Array
    }

    pub fn is_string(self) -> bool {
        self == TypeCategory::String
    }

    pub fn is_known(self) -> bool {
        self != TypeCategory::Unknown
    }
}

/// Read-only type capability, queried per expression.
///
/// Repeated queries on the same unmodified node must return the same answer.
pub trait TypeOracle: Send + Sync {
    fn query(&self, expr: &Expression) -> TypeCategory;
}

/// Oracle that answers `Unknown` for everything, disabling every type-gated rewrite
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownTypes;

impl TypeOracle for UnknownTypes {
    fn query(&self, _expr: &Expression) -> TypeCategory {
        TypeCategory::Unknown
    }
}

/// Category of `receiver.method(...)` when only the receiver's category is known
pub fn method_result_category(receiver: TypeCategory, method: &str) -> TypeCategory {
    inference::method_result_category(receiver, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_result_category() {
        assert_eq!(method_result_category(TypeCategory::Array, "slice"), TypeCategory::Array);
        assert_eq!(method_result_category(TypeCategory::Array, "join"), TypeCategory::String);
        assert_eq!(method_result_category(TypeCategory::String, "split"), TypeCategory::Array);
        assert_eq!(method_result_category(TypeCategory::String, "trim"), TypeCategory::String);
        assert_eq!(method_result_category(TypeCategory::Unknown, "map"), TypeCategory::Unknown);
        assert_eq!(method_result_category(TypeCategory::Array, "push"), TypeCategory::Unknown);
    }

    #[test]
    fn test_unknown_oracle() {
        let expr = Expression::identifier("x", crate::span::Span::dummy());
        assert_eq!(UnknownTypes.query(&expr), TypeCategory::Unknown);
    }
}
