//! # uiml-discovery
//!
//! Corpus-wide schema discovery: which element types exist across a set of
//! .ui files, which properties they carry, and which value kinds those
//! properties take.
//!
//! Discovery consumes `parse_partial` output only, never resolving imports,
//! and tolerates broken files: a file with parse errors still
//! contributes whatever parsed, and is counted. Scans are independent
//! per-file with no shared state; to parallelize, give each worker its own
//! accumulator and [`SchemaAccumulator::merge`] them once at the end. An
//! accumulator is owned by exactly one discovery pass and nothing outlives
//! it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;
use uiml_parser::document::{PropertyValue, StyleBody, UIElement};
use uiml_parser::parse_partial;

/// Statistics for one property of one element type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyStats {
    pub occurrences: usize,
    /// Value kinds seen for this property, e.g. `{"Number", "Style"}`.
    pub kinds: BTreeSet<String>,
}

/// Statistics for one element type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    pub occurrences: usize,
    pub properties: IndexMap<String, PropertyStats>,
}

/// Accumulates schema statistics across files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaAccumulator {
    pub files_scanned: usize,
    pub files_with_errors: usize,
    pub style_definitions: usize,
    pub types: IndexMap<String, TypeStats>,
}

impl SchemaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one file's source. Parse errors are tolerated; whatever lowered
    /// still counts.
    pub fn scan_source(&mut self, path: &str, source: &str) {
        let (document, errors) = parse_partial(source, path);
        self.files_scanned += 1;
        if !errors.is_empty() {
            debug!(path, errors = errors.len(), "scanning file with parse errors");
            self.files_with_errors += 1;
        }
        self.style_definitions += document.styles.len();

        for element in document.top_level() {
            self.scan_element(element);
        }
        for style in document.styles.values() {
            if let StyleBody::Element(element) = &style.body {
                self.scan_element(element);
            }
        }
    }

    fn scan_element(&mut self, element: &UIElement) {
        // Reserved node kinds (comments, prefixed blocks, wrappers) are
        // surface syntax, not schema
        if !element.element_type.as_str().starts_with('#') {
            let stats = self
                .types
                .entry(element.element_type.as_str().to_string())
                .or_default();
            stats.occurrences += 1;

            for (name, value) in &element.properties {
                let key = name.as_str();
                if key.starts_with('#') || key.starts_with('@') || key.starts_with('$') {
                    continue;
                }
                if key.starts_with("...") {
                    continue;
                }
                let property = stats.properties.entry(key.to_string()).or_default();
                property.occurrences += 1;
                property.kinds.insert(kind_of(value).to_string());
            }
        }

        for child in &element.children {
            self.scan_element(child);
        }
    }

    /// Fold another accumulator in (the serialized join point of a
    /// parallel scan).
    pub fn merge(&mut self, other: SchemaAccumulator) {
        self.files_scanned += other.files_scanned;
        self.files_with_errors += other.files_with_errors;
        self.style_definitions += other.style_definitions;
        for (type_name, incoming) in other.types {
            let stats = self.types.entry(type_name).or_default();
            stats.occurrences += incoming.occurrences;
            for (property, stat) in incoming.properties {
                let slot = stats.properties.entry(property).or_default();
                slot.occurrences += stat.occurrences;
                slot.kinds.extend(stat.kinds);
            }
        }
    }
}

/// Discovery's view of a value: symbolic wrappers report what they wrap
/// around, everything else reports its own kind.
fn kind_of(value: &PropertyValue) -> &'static str {
    match value {
        PropertyValue::Spread(inner) => kind_of(inner),
        other => other.kind(),
    }
}
