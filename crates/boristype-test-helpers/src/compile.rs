//! Test compilation helpers for BorisType
//!
//! Compile source strings through the same `Container` the CLI uses, with a
//! collecting diagnostic handler and the byte-order mark turned off.

use boristype_core::codegen::CodeGenerator;
use boristype_core::config::CompilerConfig;
use boristype_core::di::Container;
use boristype_core::diagnostics::CollectingDiagnosticHandler;
use boristype_core::parser::parse_source;
use boristype_core::pipeline::{FileOutput, Pipeline};
use boristype_core::helpers::Helper;
use boristype_core::typeinfo::{DeclaredTypes, TypeOracle};
use std::sync::Arc;

/// Compile source code with the default options
///
/// # Returns
/// The emitted text (no byte-order mark) or an error message
pub fn compile(source: &str) -> Result<String, String> {
    compile_with(source, CompilerConfig::default())
}

/// Compile source code with a custom configuration. The byte-order mark is
/// always disabled so assertions can compare plain text.
pub fn compile_with(source: &str, mut config: CompilerConfig) -> Result<String, String> {
    config.compiler_options.emit_bom = false;
    let container = Container::with_dependencies(config, Arc::new(CollectingDiagnosticHandler::new()));
    container
        .compile_source("test.ts", source)
        .map(|file| file.text)
        .map_err(|e| e.to_string())
}

/// Run the standard pipeline and return the lowered tree with its bookkeeping
pub fn lower(source: &str) -> Result<FileOutput, String> {
    let program = parse_source(source).map_err(|e| e.to_string())?;
    let oracle = DeclaredTypes::infer(&program);
    Pipeline::new()
        .run(program, &oracle, "test.ts")
        .map_err(|e| e.to_string())
}

/// Run the standard pipeline with a caller-supplied type oracle and emit the result
pub fn lower_with_oracle(source: &str, oracle: &dyn TypeOracle) -> Result<String, String> {
    let program = parse_source(source).map_err(|e| e.to_string())?;
    let output = Pipeline::new()
        .run(program, oracle, "test.ts")
        .map_err(|e| e.to_string())?;
    Ok(CodeGenerator::new().generate(&output.program))
}

/// Emitted text with the prepended helper routines removed
pub fn strip_helpers(text: &str) -> String {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_helper = false;
    for line in text.lines() {
        if depth == 0 && line.starts_with("function ") {
            let name = line["function ".len()..].split('(').next().unwrap_or_default();
            in_helper = Helper::INJECTABLE
                .iter()
                .any(|helper| helper.name() == name);
        }
        if !in_helper {
            out.push(line);
        }
        if in_helper {
            depth += line.matches('{').count();
            depth = depth.saturating_sub(line.matches('}').count());
            if depth == 0 {
                in_helper = false;
            }
        }
    }
    let mut joined = out.join("\n");
    if text.ends_with('\n') && !joined.is_empty() {
        joined.push('\n');
    }
    joined
}
