//! # uiml-evaluator
//!
//! Resolves a raw document's symbolic values (style references, imported
//! variables, arithmetic expressions) into the fully concrete document the
//! renderer consumes. The raw document is never touched; rendering and
//! editing stay decoupled.

pub mod diagnostics;
pub mod evaluator;
pub mod scope;

pub use diagnostics::{DiagnosticSink, EvalWarning, NullSink};
pub use evaluator::{evaluate, resolve, resolve_at_path, resolve_with_diagnostics};
pub use scope::{ImportError, ImportResolver, ResolveSession, ResolvedSource, VariableScope};

#[cfg(test)]
mod tests_evaluation;
