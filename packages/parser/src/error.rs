use crate::tokenizer::Position;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single parse diagnostic. Parsing collects these instead of aborting;
/// `parse()` succeeds only when none were collected.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    pub fn at_end(message: impl Into<String>) -> Self {
        Self {
            line: 0,
            column: 0,
            message: format!("unexpected end of input: {}", message.into()),
        }
    }
}

/// Export failures are structural-invariant violations; they carry enough
/// context to locate the offending node.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid property '{property}': {message}")]
    InvalidProperty { property: String, message: String },

    #[error("unexpected export failure: {message}")]
    Unexpected {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ExportError {
    pub fn invalid_property(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            property: property.into(),
            message: message.into(),
        }
    }
}
