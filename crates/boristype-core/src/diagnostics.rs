use crate::span::Span;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

impl DiagnosticLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        }
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub span: Span,
    pub message: String,
    /// Source file the diagnostic belongs to, once the pipeline knows it
    pub file: Option<String>,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, span, message)
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, span, message)
    }

    pub fn info(span: Span, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, span, message)
    }

    fn with_level(level: DiagnosticLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            level,
            span,
            message: message.into(),
            file: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{} at {}:{}: {}",
                self.level.as_str(),
                file,
                self.span,
                self.message
            ),
            None => write!(f, "{} at {}: {}", self.level.as_str(), self.span, self.message),
        }
    }
}

/// Trait for handling diagnostics
/// This allows for dependency injection and testing with mock handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, span: Span, message: &str) {
        self.report(Diagnostic::error(span, message));
    }

    fn warning(&self, span: Span, message: &str) {
        self.report(Diagnostic::warning(span, message));
    }

    fn info(&self, span: Span, message: &str) {
        self.report(Diagnostic::info(span, message));
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.get_diagnostics()
            .iter()
            .filter(|d| d.level == level)
            .count()
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

fn lock(diagnostics: &Mutex<Vec<Diagnostic>>) -> MutexGuard<'_, Vec<Diagnostic>> {
    diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Console-based diagnostic handler that prints to stderr
pub struct ConsoleDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        if self.pretty {
            let location = match &diagnostic.file {
                Some(file) => format!("{}:{}", file, diagnostic.span),
                None => diagnostic.span.to_string(),
            };
            eprintln!(
                "\x1b[1m{}\x1b[0m at {}: {}",
                diagnostic.level.as_str(),
                location,
                diagnostic.message
            );
        } else {
            eprintln!("{}", diagnostic);
        }

        lock(&self.diagnostics).push(diagnostic);
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }
}

impl Default for CollectingDiagnosticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        lock(&self.diagnostics).push(diagnostic);
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let span = Span::new(0, 5, 1, 1);
        let diag = Diagnostic::error(span, "Test error");

        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.message, "Test error");
        assert!(diag.file.is_none());
    }

    #[test]
    fn test_display_with_file() {
        let diag = Diagnostic::warning(Span::new(0, 1, 3, 7), "unsupported").in_file("main.ts");
        assert_eq!(diag.to_string(), "warning at main.ts:3:7: unsupported");
    }

    #[test]
    fn test_collecting_handler() {
        let handler = CollectingDiagnosticHandler::new();
        let span = Span::new(0, 5, 1, 1);

        handler.error(span, "Error 1");
        handler.warning(span, "Warning 1");
        handler.error(span, "Error 2");

        assert_eq!(handler.error_count(), 2);
        assert_eq!(handler.warning_count(), 1);
        assert!(handler.has_errors());
        assert_eq!(handler.get_diagnostics().len(), 3);
    }

    #[test]
    fn test_no_errors() {
        let handler = CollectingDiagnosticHandler::new();
        let span = Span::new(0, 5, 1, 1);

        handler.warning(span, "Warning 1");
        handler.info(span, "Info 1");

        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }
}
