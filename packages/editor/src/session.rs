//! Edit session: one document, one overlay, one writer.

use crate::deltas::{DeltaId, EditDelta, EditDeltaTracker};
use crate::errors::SessionError;
use uiml_parser::serializer::{export, FormatterConfig};
use uiml_parser::UIDocument;

/// Owns the pristine base document plus the live edit overlay. The base is
/// never mutated; every read folds the overlay on demand.
pub struct EditSession {
    base: UIDocument,
    tracker: EditDeltaTracker,
}

impl EditSession {
    pub fn new(base: UIDocument) -> Self {
        Self {
            base,
            tracker: EditDeltaTracker::new(),
        }
    }

    pub fn base(&self) -> &UIDocument {
        &self.base
    }

    pub fn is_dirty(&self) -> bool {
        !self.tracker.is_empty()
    }

    pub fn record(&mut self, delta: EditDelta) -> DeltaId {
        self.tracker.record(delta)
    }

    pub fn undo(&mut self, id: DeltaId) -> bool {
        self.tracker.remove(id)
    }

    /// The current document with all edits folded in.
    pub fn document(&self) -> Result<UIDocument, SessionError> {
        Ok(self.tracker.apply_to(&self.base)?)
    }

    /// Export the edited document. Untouched properties re-emit exactly as
    /// parsed; edited ones come out as concrete literals.
    pub fn export(&self, config: &FormatterConfig) -> Result<String, SessionError> {
        let document = self.tracker.apply_to(&self.base)?;
        Ok(export(&document, config)?)
    }

    /// Replace the base after a save/re-parse; the overlay is spent.
    pub fn rebase(&mut self, base: UIDocument) {
        self.base = base;
        self.tracker = EditDeltaTracker::new();
    }
}
