use crate::ast::expression::{Expression, ExpressionKind};
use crate::ast::{Ident, Program};
use crate::pipeline::{LoweringPass, PassContext};
use crate::visit::{walk_expression, Fold};
use tracing::trace;

/// Renames identifiers holding characters the target dialect rejects
pub struct IdentifierSanitizer;

impl LoweringPass for IdentifierSanitizer {
    fn name(&self) -> &'static str {
        "identifier-sanitizer"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        Sanitizer { ctx }.fold_program(program)
    }
}

fn is_legal(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_<HEX>_`, its code point
/// in upper-case hex, so `$` becomes `_24_`. Legal names come back unchanged.
pub fn sanitize_identifier(name: &str) -> Option<String> {
    if name.chars().all(is_legal) {
        return None;
    }

    let mut sanitized = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        if is_legal(c) {
            sanitized.push(c);
        } else {
            sanitized.push_str(&format!("_{:X}_", c as u32));
        }
    }
    Some(sanitized)
}

struct Sanitizer<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Sanitizer<'_, '_> {
    fn rename(&mut self, ident: Ident) -> Ident {
        match sanitize_identifier(&ident.node) {
            Some(name) => {
                trace!(from = %ident.node, to = %name, "sanitized identifier");
                self.ctx.reserve_name(&name);
                Ident::new(name, ident.span)
            }
            None => ident,
        }
    }
}

impl Fold for Sanitizer<'_, '_> {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        let expr = walk_expression(self, expr);
        match expr.kind {
            ExpressionKind::Identifier(name) => {
                let ident = self.rename(Ident::new(name, expr.span));
                Expression::with_id(expr.id, ExpressionKind::Identifier(ident.node), expr.span)
            }
            kind => Expression::with_id(expr.id, kind, expr.span),
        }
    }

    fn fold_binding(&mut self, ident: Ident) -> Ident {
        self.rename(ident)
    }

    fn fold_property_name(&mut self, ident: Ident) -> Ident {
        self.rename(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::lower_with;
    use proptest::prelude::*;

    fn sanitize(source: &str) -> String {
        lower_with(source, vec![Box::new(IdentifierSanitizer)])
    }

    #[test]
    fn test_dollar_is_replaced() {
        assert_eq!(sanitize_identifier("$el").as_deref(), Some("_24_el"));
        assert_eq!(sanitize_identifier("a$b$").as_deref(), Some("a_24_b_24__24_"));
        assert_eq!(sanitize_identifier("plain_name1"), None);
    }

    #[test]
    fn test_non_ascii_uses_code_point() {
        assert_eq!(sanitize_identifier("café").as_deref(), Some("caf_E9_"));
    }

    #[test]
    fn test_renames_bindings_references_and_properties() {
        let output = sanitize("const $a = 1;\nfunction f($b) { return $a + $b + o.$c; }");
        assert!(output.contains("const _24_a = 1;"));
        assert!(output.contains("function f(_24_b)"));
        assert!(output.contains("return _24_a + _24_b + o._24_c;"));
        assert!(!output.contains('$'));
    }

    #[test]
    fn test_string_keys_untouched() {
        let output = sanitize("const o = { \"$x\": 1 };");
        assert!(output.contains("\"$x\": 1"));
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_legal_and_stable(name in "[a-zA-Z_$][a-zA-Z0-9_$\u{e0}-\u{ff}]{0,12}") {
            let sanitized = sanitize_identifier(&name).unwrap_or_else(|| name.clone());
            prop_assert!(sanitized.chars().all(is_legal));
            prop_assert_eq!(sanitize_identifier(&sanitized), None);
        }

        #[test]
        fn prop_legal_names_unchanged(name in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
            prop_assert_eq!(sanitize_identifier(&name), None);
        }
    }
}
