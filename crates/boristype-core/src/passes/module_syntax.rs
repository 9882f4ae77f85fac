use crate::ast::statement::{ExportKind, Statement};
use crate::ast::Program;
use crate::pipeline::{LoweringPass, PassContext};
use crate::visit::{walk_statement, Fold};
use tracing::trace;

/// Strips import and export wrappers. Exported declarations stay in place as
/// plain declarations; everything that only links modules disappears.
pub struct ModuleSyntaxEliminator;

impl LoweringPass for ModuleSyntaxEliminator {
    fn name(&self) -> &'static str {
        "module-syntax"
    }

    fn run(&self, program: Program, _ctx: &mut PassContext<'_>) -> Program {
        ModuleStripper.fold_program(program)
    }
}

struct ModuleStripper;

impl Fold for ModuleStripper {
    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        match statement {
            Statement::Import(import) => {
                trace!(source = %import.source, "removed import");
                Vec::new()
            }
            Statement::Export(export) => match export.kind {
                ExportKind::Declaration(inner) | ExportKind::DefaultDeclaration(inner) => {
                    self.fold_statement(*inner)
                }
                ExportKind::DefaultExpression(expr) => {
                    walk_statement(self, Statement::Expression(expr))
                }
                ExportKind::Named { .. } | ExportKind::All { .. } => Vec::new(),
            },
            other => walk_statement(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::lower_with;
    use indoc::indoc;

    fn strip(source: &str) -> String {
        lower_with(source, vec![Box::new(ModuleSyntaxEliminator)])
    }

    #[test]
    fn test_imports_removed() {
        let output = strip(indoc! {r#"
            import "./side-effect";
            import def from "./a";
            import * as ns from "./b";
            import { x, y as z } from "./c";
            const keep = 1;
        "#});
        assert_eq!(output.trim(), "const keep = 1;");
    }

    #[test]
    fn test_exported_declarations_unwrapped() {
        let output = strip(indoc! {r#"
            export const a = 1;
            export function f() {}
            export default function g() {}
            export { a as b };
            export * from "./other";
        "#});
        assert!(output.contains("const a = 1;"));
        assert!(output.contains("function f()"));
        assert!(output.contains("function g()"));
        assert!(!output.contains("export"));
        assert!(!output.contains("other"));
    }

    #[test]
    fn test_default_expression_becomes_statement() {
        let output = strip("export default compute(1);");
        assert_eq!(output.trim(), "compute(1);");
    }
}
