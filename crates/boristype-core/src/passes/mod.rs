//! Lowering passes, one modern construct each.

mod builtin_dispatch;
mod destructuring;
mod for_of;
mod functional_chain;
mod identifier_sanitizer;
mod loop_scope;
mod module_syntax;
mod spread;
mod syntax_sugar;

pub use builtin_dispatch::BuiltinDispatch;
pub use destructuring::DestructuringLowering;
pub use for_of::ForOfLowering;
pub use functional_chain::FunctionalChainLowering;
pub use identifier_sanitizer::{sanitize_identifier, IdentifierSanitizer};
pub use loop_scope::LoopScopeLowering;
pub use module_syntax::ModuleSyntaxEliminator;
pub use spread::SpreadLowering;
pub use syntax_sugar::SyntaxSugarLowering;

use crate::pipeline::LoweringPass;

/// Every pass in execution order.
///
/// `functional-chain` reads oracle answers for untouched nodes, so it runs before
/// anything restructures expressions. `loop-scope` runs last so it sees every loop
/// the earlier passes introduce.
pub fn standard_passes() -> Vec<Box<dyn LoweringPass>> {
    vec![
        Box::new(IdentifierSanitizer),
        Box::new(ModuleSyntaxEliminator),
        Box::new(FunctionalChainLowering),
        Box::new(SyntaxSugarLowering),
        Box::new(ForOfLowering),
        Box::new(BuiltinDispatch),
        Box::new(SpreadLowering),
        Box::new(DestructuringLowering),
        Box::new(LoopScopeLowering),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ast::Program;
    use crate::codegen::CodeGenerator;
    use crate::parser::parse_source;
    use crate::pipeline::{FileOutput, LoweringPass, Pipeline};
    use crate::typeinfo::DeclaredTypes;

    /// Runs `passes` over `source` with declaration-based types
    pub fn run_passes(source: &str, passes: Vec<Box<dyn LoweringPass>>) -> FileOutput {
        let program = parse_source(source).unwrap();
        let oracle = DeclaredTypes::infer(&program);
        Pipeline::with_passes(passes)
            .run(program, &oracle, "test.ts")
            .unwrap()
    }

    /// Emitted text after running `passes`
    pub fn lower_with(source: &str, passes: Vec<Box<dyn LoweringPass>>) -> String {
        emit(&run_passes(source, passes).program)
    }

    pub fn emit(program: &Program) -> String {
        CodeGenerator::new().generate(program)
    }
}
