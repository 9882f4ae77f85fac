pub mod ast;
pub mod codegen;
pub mod config;
pub mod di;
pub mod diagnostics;
pub mod errors;
pub mod helpers;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod passes;
pub mod pipeline;
pub mod span;
pub mod typeinfo;
pub mod visit;

pub use codegen::{CodeGenerator, OutputKind};
pub use config::{CliOverrides, CompilerConfig};
pub use di::{BatchResult, Container, EmittedFile, SourceFile};
pub use diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
pub use errors::CompilationError;
pub use helpers::{Helper, HelperKind};
pub use parser::parse_source;
pub use pipeline::{FileOutput, LoweringPass, PassContext, Pipeline};
pub use typeinfo::{DeclaredTypes, TypeCategory, TypeOracle, UnknownTypes};
