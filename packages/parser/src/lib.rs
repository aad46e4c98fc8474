//! # uiml-parser
//!
//! Lossless front half of the .ui pipeline: tokenize → parse →
//! lower → (edit) → export.
//!
//! The raw [`UIDocument`] keeps symbolic values (style references, variables,
//! arithmetic) exactly as written; resolving them to concrete values is the
//! evaluator crate's job. Export reverses every lowering-time abstraction so
//! untouched source constructs re-emit in their original spelling.

pub mod ast;
pub mod document;
pub mod error;
pub mod id_generator;
pub mod lowering;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_roundtrip;

pub use document::{
    AnchorField, AnchorValue, BinaryOp, ColorValue, Comment, CommentAnchor, ElementId,
    ElementType, ExpressionValue, NodeId, PropertyName, PropertyValue, StyleBody, StyleDefinition,
    StyleReference, TupleEntry, TupleValue, UIDocument, UIElement, VariableRefValue,
};
pub use error::{ExportError, ParseError};
pub use serializer::{export, export_default, Exporter, FormatterConfig};
pub use tokenizer::{tokenize, Position, Token};

/// Parse source text into a raw document. Succeeds only when zero parse
/// errors were collected; otherwise the full error list is returned.
pub fn parse(source: &str) -> Result<UIDocument, Vec<ParseError>> {
    parse_with_path(source, "<memory>")
}

/// Like [`parse`], with a file path that seeds durable node-id generation so
/// an unchanged file always lowers to the same identities.
pub fn parse_with_path(source: &str, path: &str) -> Result<UIDocument, Vec<ParseError>> {
    let (document, errors) = parse_partial(source, path);
    if errors.is_empty() {
        Ok(document)
    } else {
        Err(errors)
    }
}

/// Best-effort parse for editors and corpus scans: always yields a document
/// for whatever parsed, alongside every collected diagnostic.
pub fn parse_partial(source: &str, path: &str) -> (UIDocument, Vec<ParseError>) {
    let (ast, errors) = parser::parse_ast(source);
    let document = lowering::lower_document(&ast, path);
    (document, errors)
}
