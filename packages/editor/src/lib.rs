//! # uiml-editor
//!
//! Edit overlay for raw .ui documents.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: .ui text → raw UIDocument           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditDeltaTracker overlay            │
//! │  - record / remove (undo) typed deltas      │
//! │  - apply_to: copy-on-write fold             │
//! │  - minimal-diff export via uiml-parser      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ exporter: edited document → .ui text        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The raw document is the source of truth and is never mutated in place:
//! applying the overlay builds a new tree that shares every untouched subtree
//! with the base. The resolved (render) document is a separate pipeline and
//! is never produced or consumed here.

mod deltas;
mod errors;
mod session;

pub use deltas::{DeltaId, EditDelta, EditDeltaTracker, MoveAnchor, RecordedDelta};
pub use errors::{DeltaError, SessionError};
pub use session::EditSession;
