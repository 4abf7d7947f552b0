use std::sync::Mutex;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Info,
}

/// A message addressed to the user of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }
}

/// Sink for user-facing cache messages.
///
/// The cache never logs through a global; a handler is injected when the
/// store is built, which keeps tests able to observe every warning.
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn warning(&self, message: &str) {
        self.report(Diagnostic::warning(message));
    }

    fn info(&self, message: &str) {
        self.report(Diagnostic::info(message));
    }

    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

fn count_level(diagnostics: &Mutex<Vec<Diagnostic>>, level: DiagnosticLevel) -> usize {
    diagnostics
        .lock()
        .map(|d| d.iter().filter(|d| d.level == level).count())
        .unwrap_or(0)
}

fn snapshot(diagnostics: &Mutex<Vec<Diagnostic>>) -> Vec<Diagnostic> {
    diagnostics.lock().map(|d| d.clone()).unwrap_or_default()
}

/// Forwards every diagnostic to `tracing` and keeps a copy
#[derive(Debug, Default)]
pub struct TracingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl TracingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticHandler for TracingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Warning => tracing::warn!("{}", diagnostic.message),
            DiagnosticLevel::Info => tracing::info!("{}", diagnostic.message),
        }

        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        snapshot(&self.diagnostics)
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
#[derive(Debug, Default)]
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported at the given level, in report order
    pub fn messages(&self, level: DiagnosticLevel) -> Vec<String> {
        snapshot(&self.diagnostics)
            .into_iter()
            .filter(|d| d.level == level)
            .map(|d| d.message)
            .collect()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        snapshot(&self.diagnostics)
    }
}
