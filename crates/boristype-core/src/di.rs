use crate::codegen::{finish_output, CodeGenerator, OutputKind};
use crate::config::CompilerConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, Diagnostic, DiagnosticHandler};
use crate::errors::CompilationError;
use crate::parser::parse_source;
use crate::pipeline::Pipeline;
use crate::typeinfo::DeclaredTypes;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Worker stack size for batch compilation, sized for the deepest trees the parser accepts
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// One input file handed to a batch
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// A compiled file, ready to be written
#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub name: String,
    pub kind: OutputKind,
    /// Full file text, wrapper and byte-order mark included
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-file results of a batch, in input order
#[derive(Debug)]
pub struct BatchResult {
    pub files: Vec<(String, Result<EmittedFile, CompilationError>)>,
}

impl BatchResult {
    pub fn emitted(&self) -> impl Iterator<Item = &EmittedFile> {
        self.files.iter().filter_map(|(_, result)| result.as_ref().ok())
    }

    /// Files that failed, excluding the ones skipped after an abort
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CompilationError)> {
        self.files.iter().filter_map(|(name, result)| match result {
            Err(error) if !error.is_aborted() => Some((name.as_str(), error)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, result)| matches!(result, Err(error) if error.is_aborted()))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|(_, result)| result.is_err())
    }
}

/// Dependency injection container
/// Manages all shared dependencies and creates instances with proper wiring
pub struct Container {
    config: Arc<CompilerConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    pipeline: Pipeline,
    workers: Option<rayon::ThreadPool>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: CompilerConfig) -> Self {
        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(config.compiler_options.pretty));
        Self::with_dependencies(config, diagnostic_handler)
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(config: CompilerConfig, diagnostic_handler: Arc<dyn DiagnosticHandler>) -> Self {
        let workers = match rayon::ThreadPoolBuilder::new()
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|index| format!("btc-worker-{}", index))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "falling back to the global thread pool");
                None
            }
        };

        Container {
            config: Arc::new(config),
            diagnostic_handler,
            pipeline: Pipeline::new(),
            workers,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<CompilerConfig> {
        &self.config
    }

    /// Get the diagnostic handler
    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }

    /// Get the warning count
    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }

    /// Parses, lowers and emits one file. Pass warnings go to the diagnostic handler;
    /// a parse failure is reported there too and returned as the error.
    pub fn compile_source(&self, name: &str, source: &str) -> Result<EmittedFile, CompilationError> {
        match &self.workers {
            Some(pool) => pool.install(|| self.compile_file(name, source)),
            None => self.compile_file(name, source),
        }
    }

    fn compile_file(&self, name: &str, source: &str) -> Result<EmittedFile, CompilationError> {
        let program = parse_source(source).map_err(|e| {
            self.diagnostic_handler
                .report(Diagnostic::error(e.span, e.message.clone()).in_file(name));
            CompilationError::Parse {
                file: name.to_string(),
                message: e.message,
                span: e.span,
            }
        })?;

        let oracle = DeclaredTypes::infer(&program);
        let kind = OutputKind::for_program(&program);
        let output = self.pipeline.run(program, &oracle, name)?;

        for diagnostic in &output.diagnostics {
            self.diagnostic_handler.report(diagnostic.clone());
        }

        let options = &self.config.compiler_options;
        let code = CodeGenerator::new()
            .with_escape_non_ascii(options.escape_non_ascii)
            .generate(&output.program);
        debug!(file = name, ?kind, helpers = output.helpers.injectables().count(), "emitted");

        Ok(EmittedFile {
            name: name.to_string(),
            kind,
            text: finish_output(&code, kind, options.emit_bom),
            diagnostics: output.diagnostics,
        })
    }

    /// Compiles every file in parallel. With `abortOnError`, files that have not
    /// started when the first failure is seen are skipped.
    pub fn compile_batch(&self, files: &[SourceFile]) -> BatchResult {
        info!(count = files.len(), "compiling batch");
        match &self.workers {
            Some(pool) => pool.install(|| self.compile_all(files)),
            None => self.compile_all(files),
        }
    }

    fn compile_all(&self, files: &[SourceFile]) -> BatchResult {
        let abort_on_error = self.config.compiler_options.abort_on_error;
        let aborted = AtomicBool::new(false);

        let results = files
            .par_iter()
            .map(|file| {
                if abort_on_error && aborted.load(Ordering::Acquire) {
                    return (
                        file.name.clone(),
                        Err(CompilationError::Aborted {
                            file: file.name.clone(),
                        }),
                    );
                }
                let result = self.compile_file(&file.name, &file.source);
                if let Err(error) = &result {
                    warn!(file = %file.name, %error, "file failed");
                    if abort_on_error {
                        aborted.store(true, Ordering::Release);
                    }
                }
                (file.name.clone(), result)
            })
            .collect();

        BatchResult { files: results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::BYTE_ORDER_MARK;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::span::Span;

    fn container(config: CompilerConfig) -> (Container, Arc<CollectingDiagnosticHandler>) {
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        (Container::with_dependencies(config, diagnostics.clone()), diagnostics)
    }

    #[test]
    fn test_container_creation() {
        let container = Container::new(CompilerConfig::default());
        assert_eq!(container.error_count(), 0);
        assert!(!container.has_errors());
    }

    #[test]
    fn test_container_with_mock_dependencies() {
        let (container, _) = container(CompilerConfig::default());
        container.diagnostic_handler().error(Span::dummy(), "Test error");
        assert!(container.has_errors());
        assert_eq!(container.error_count(), 1);
    }

    #[test]
    fn test_compile_source_emits_bom_and_code() {
        let (container, _) = container(CompilerConfig::default());
        let file = container.compile_source("a.ts", "let x = 1;").unwrap();
        assert_eq!(file.kind, OutputKind::Script);
        assert!(file.text.starts_with(BYTE_ORDER_MARK));
        assert!(file.text.ends_with("var x = 1;\n"));
    }

    #[test]
    fn test_bom_can_be_disabled() {
        let mut config = CompilerConfig::default();
        config.compiler_options.emit_bom = false;
        let (container, _) = container(config);
        let file = container.compile_source("a.ts", "let x = 1;").unwrap();
        assert_eq!(file.text, "var x = 1;\n");
    }

    #[test]
    fn test_markers_select_wrapper() {
        let mut config = CompilerConfig::default();
        config.compiler_options.emit_bom = false;
        let (container, _) = container(config);
        let html = container.compile_source("page.ts", "/// @html\nlog(1);").unwrap();
        assert_eq!(html.kind, OutputKind::Html);
        assert_eq!(html.text, "<%\n/// @html\nlog(1);\n\n%>");
    }

    #[test]
    fn test_parse_error_reported_and_returned() {
        let (container, diagnostics) = container(CompilerConfig::default());
        let result = container.compile_source("bad.ts", "let = ;");
        assert!(matches!(result, Err(CompilationError::Parse { .. })));
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.get_diagnostics()[0].file.as_deref(), Some("bad.ts"));
    }

    #[test]
    fn test_pass_warnings_forwarded() {
        let (container, diagnostics) = container(CompilerConfig::default());
        let file = container.compile_source("w.ts", "const { a: { ...r } } = o;").unwrap();
        assert_eq!(file.diagnostics.len(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let (container, _) = container(CompilerConfig::default());
        let files = vec![
            SourceFile::new("a.ts", "let a = 1;"),
            SourceFile::new("b.ts", "let = ;"),
            SourceFile::new("c.ts", "let c = 3;"),
        ];
        let result = container.compile_batch(&files);
        let names: Vec<&str> = result.files.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.ts", "b.ts", "c.ts"]);
        assert_eq!(result.emitted().count(), 2);
        assert_eq!(result.failures().count(), 1);
        assert!(result.has_failures());
    }

    #[test]
    fn test_batch_without_abort_compiles_everything() {
        let (container, _) = container(CompilerConfig::default());
        let files: Vec<SourceFile> = (0..8)
            .map(|i| SourceFile::new(format!("f{}.ts", i), "let = ;"))
            .collect();
        let result = container.compile_batch(&files);
        assert_eq!(result.failures().count(), 8);
        assert_eq!(result.skipped(), 0);
    }

    #[test]
    fn test_compile_source_nesting_independent_of_caller_stack() {
        let (container, _) = container(CompilerConfig::default());
        let container = Arc::new(container);
        let worker = Arc::clone(&container);
        let source = format!("x = {}1{};", "(".repeat(100), ")".repeat(100));

        let result = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || worker.compile_source("nested.ts", &source).is_ok())
            .unwrap()
            .join()
            .unwrap();
        assert!(result);
    }

    #[test]
    fn test_batch_survives_deeply_nested_input() {
        let (container, _) = container(CompilerConfig::default());
        let deep = format!("x = {}1{};", "(".repeat(5000), ")".repeat(5000));
        let nested = format!("x = {}1{};", "(".repeat(100), ")".repeat(100));
        let files = vec![
            SourceFile::new("deep.ts", deep),
            SourceFile::new("nested.ts", nested),
            SourceFile::new("plain.ts", "let a = 1;"),
        ];
        let result = container.compile_batch(&files);

        let failures: Vec<&str> = result.failures().map(|(name, _)| name).collect();
        assert_eq!(failures, vec!["deep.ts"]);
        match &result.files[0].1 {
            Err(CompilationError::Parse { message, .. }) => assert!(message.contains("Nesting deeper than")),
            other => panic!("Expected a parse error, got {:?}", other),
        }
        assert_eq!(result.emitted().count(), 2);
    }
}
