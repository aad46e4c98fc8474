use thiserror::Error;
use uiml_parser::{ExportError, NodeId};

#[derive(Error, Debug)]
pub enum DeltaError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("cannot move the document root")]
    CannotMoveRoot,

    #[error("moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Delta(#[from] DeltaError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
