use serde::{Deserialize, Serialize};

/// An advisory produced during evaluation. Evaluation never fails hard;
/// unresolved references, missing imports, cycles and division by zero all
/// produce a best-effort value plus one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalWarning {
    pub message: String,
    /// Canonical text of the reference involved, when there is one.
    pub reference: Option<String>,
}

/// Side channel for evaluation diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, warning: EvalWarning);
}

impl DiagnosticSink for Vec<EvalWarning> {
    fn report(&mut self, warning: EvalWarning) {
        self.push(warning);
    }
}

/// Drops warnings; they still reach the `tracing` log.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _warning: EvalWarning) {}
}
