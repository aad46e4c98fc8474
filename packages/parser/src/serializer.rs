//! Exporter/formatter: raw [`UIDocument`] → source text.
//!
//! Deterministic given a [`FormatterConfig`]. Every lowering-time abstraction
//! is reversed here: engine aliases come back (`Button` → `TextButton`),
//! reserved node kinds regenerate their original surface syntax, and the
//! synthetic multi-root wrapper is flattened. Formatting stabilizes after one
//! pass: `export(parse(export(d))) == export(d)`.

use crate::document::*;
use crate::error::ExportError;
use crate::tokenizer::escape;
use serde::{Deserialize, Serialize};

/// Formatting knobs. The defaults match the hand-written corpus: four-space
/// indent, no semicolon after blocks, blank lines between top-level blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub indent_width: usize,
    pub use_tabs: bool,
    pub semicolon_after_block: bool,
    pub blank_line_between_blocks: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            use_tabs: false,
            semicolon_after_block: false,
            blank_line_between_blocks: true,
        }
    }
}

/// Serialize a document with the default configuration.
pub fn export_default(document: &UIDocument) -> Result<String, ExportError> {
    export(document, &FormatterConfig::default())
}

/// Serialize a document to source text.
pub fn export(document: &UIDocument, config: &FormatterConfig) -> Result<String, ExportError> {
    let mut exporter = Exporter::new(config);
    exporter.export_document(document)
}

pub struct Exporter<'a> {
    config: &'a FormatterConfig,
    indent_level: usize,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a FormatterConfig) -> Self {
        Self {
            config,
            indent_level: 0,
        }
    }

    pub fn export_document(&mut self, document: &UIDocument) -> Result<String, ExportError> {
        let mut out = String::new();

        self.write_comments(document, &CommentAnchor::FileHeader, &mut out);

        for (alias, path) in &document.imports {
            self.write_comments(
                document,
                &CommentAnchor::Import {
                    alias: alias.clone(),
                },
                &mut out,
            );
            out.push_str(&format!("${} = \"{}\";\n", alias, escape(path)));
        }
        if !document.imports.is_empty() && self.config.blank_line_between_blocks {
            out.push('\n');
        }

        for (name, style) in &document.styles {
            self.write_comments(
                document,
                &CommentAnchor::Style { name: name.clone() },
                &mut out,
            );
            self.serialize_style_definition(style, &mut out)?;
        }
        if !document.styles.is_empty() && self.config.blank_line_between_blocks {
            out.push('\n');
        }

        let roots = document.top_level();
        for (index, element) in roots.iter().enumerate() {
            if index > 0 && self.config.blank_line_between_blocks {
                out.push('\n');
            }
            self.write_comments(document, &CommentAnchor::Element { index }, &mut out);
            self.serialize_element(element, &mut out)?;
        }

        self.write_comments(document, &CommentAnchor::FileFooter, &mut out);

        Ok(out)
    }

    fn write_comments(&self, document: &UIDocument, anchor: &CommentAnchor, out: &mut String) {
        for comment in document.comments.iter().filter(|c| &c.anchor == anchor) {
            self.write_indent(out);
            write_comment_text(comment.text.as_str(), comment.block, out);
        }
    }

    fn serialize_style_definition(
        &mut self,
        style: &StyleDefinition,
        out: &mut String,
    ) -> Result<(), ExportError> {
        out.push_str(&format!("@{} = ", style.name));
        match &style.body {
            StyleBody::Scalar(value) => {
                self.format_value(value, out)?;
                out.push_str(";\n");
            }
            StyleBody::Tuple(tuple) => {
                self.format_tuple(tuple, out)?;
                out.push_str(";\n");
            }
            StyleBody::Constructor {
                type_name,
                properties,
            } => {
                out.push_str(type_name);
                out.push('(');
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key.as_str());
                    out.push_str(": ");
                    self.format_value(value, out)?;
                }
                out.push_str(");\n");
            }
            StyleBody::Element(element) => {
                self.serialize_element(element, out)?;
                // The element printer ends with `}\n`; a style definition
                // terminates with `;`
                if out.ends_with('\n') {
                    out.pop();
                }
                if out.ends_with(';') {
                    out.pop();
                }
                out.push_str(";\n");
            }
        }
        Ok(())
    }

    fn serialize_element(&mut self, element: &UIElement, out: &mut String) -> Result<(), ExportError> {
        if element.is_wrapper() {
            return Err(ExportError::InvalidDocument(
                "synthetic document wrapper below the root".to_string(),
            ));
        }

        if element.is_comment() {
            return self.serialize_comment_child(element, out);
        }

        self.write_indent(out);

        // Header
        let mut property_rename: Option<(&str, &str)> = None;
        if element.is_prefixed() {
            let prefix = match element.property(PREFIX_PROP) {
                Some(PropertyValue::Text(text)) => text.as_str(),
                _ => {
                    return Err(ExportError::invalid_property(
                        PREFIX_PROP,
                        "prefixed element is missing its prefix text",
                    ))
                }
            };
            if prefix.is_empty() && element.id.is_none() {
                return Err(ExportError::InvalidDocument(
                    "prefixed element with neither prefix nor id".to_string(),
                ));
            }
            out.push_str(prefix);
            if let Some(id) = &element.id {
                if !prefix.is_empty() {
                    out.push(' ');
                }
                out.push_str(&format!("#{}", id));
            }
        } else {
            let type_name = element
                .source_type
                .as_ref()
                .unwrap_or(&element.element_type);
            if element.source_type.as_ref().map(|t| t.as_str()) == Some("Group")
                && element.element_type.as_str() == "ScrollView"
            {
                property_rename = Some(("Orientation", "LayoutMode"));
            }
            out.push_str(type_name.as_str());
            if let Some(id) = &element.id {
                out.push_str(&format!(" #{}", id));
            }
        }

        out.push_str(" {\n");
        self.indent_level += 1;

        for (key, value) in &element.properties {
            if element.is_prefixed() && key.as_str() == PREFIX_PROP {
                continue;
            }
            self.serialize_statement(key, value, property_rename, out)?;
        }

        for child in &element.children {
            self.serialize_element(child, out)?;
        }

        self.indent_level -= 1;
        self.write_indent(out);
        out.push('}');
        if self.config.semicolon_after_block {
            out.push(';');
        }
        out.push('\n');
        Ok(())
    }

    fn serialize_comment_child(
        &self,
        element: &UIElement,
        out: &mut String,
    ) -> Result<(), ExportError> {
        let text = match element.property(COMMENT_TEXT_PROP) {
            Some(PropertyValue::Text(text)) => text.as_str(),
            _ => {
                return Err(ExportError::invalid_property(
                    COMMENT_TEXT_PROP,
                    "comment node is missing its text",
                ))
            }
        };
        let block = matches!(
            element.property(COMMENT_BLOCK_PROP),
            Some(PropertyValue::Boolean(true))
        );
        self.write_indent(out);
        write_comment_text(text, block, out);
        Ok(())
    }

    /// One body statement: a property, a scoped style declaration or a style
    /// use, decided by the reserved key encodings from lowering.
    fn serialize_statement(
        &mut self,
        key: &PropertyName,
        value: &PropertyValue,
        property_rename: Option<(&str, &str)>,
        out: &mut String,
    ) -> Result<(), ExportError> {
        self.write_indent(out);

        let is_use = key.as_str().starts_with("#use-")
            || value.canonical_reference_text().as_deref() == Some(key.as_str());
        if is_use {
            self.format_value(value, out)?;
            out.push_str(";\n");
            return Ok(());
        }

        if let Some(name) = key.as_str().strip_prefix('@') {
            out.push_str(&format!("@{} = ", name));
            self.format_value(value, out)?;
            out.push_str(";\n");
            return Ok(());
        }

        let mut name = key.as_str();
        if let Some((from, to)) = property_rename {
            if name == from {
                name = to;
            }
        }
        out.push_str(name);
        out.push_str(": ");
        self.format_value(value, out)?;
        out.push_str(";\n");
        Ok(())
    }

    /// Value formatting dispatches over the full closed union. No wildcard
    /// arm: adding a `PropertyValue` kind will not compile until it is
    /// handled here.
    fn format_value(&self, value: &PropertyValue, out: &mut String) -> Result<(), ExportError> {
        match value {
            PropertyValue::Text(text) => {
                out.push('"');
                out.push_str(&escape(text));
                out.push('"');
            }
            PropertyValue::Number(n) => out.push_str(&format_number(*n)),
            PropertyValue::Percent(p) => {
                // Two decimal places, trailing zeroes dropped
                let rounded = (p * 100.0).round() / 100.0;
                out.push_str(&format_number(rounded));
                out.push('%');
            }
            PropertyValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            PropertyValue::Color(color) => {
                out.push('#');
                out.push_str(&color.rgb);
                if let Some(alpha) = color.alpha {
                    out.push('(');
                    out.push_str(&format_number(alpha));
                    out.push(')');
                }
            }
            PropertyValue::Anchor(anchor) => {
                out.push('(');
                for (i, (field, value)) in anchor.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(field.as_str());
                    out.push_str(": ");
                    self.format_value(value, out)?;
                }
                out.push(')');
            }
            PropertyValue::Style(reference) => self.format_style_reference(reference, out)?,
            PropertyValue::Tuple(tuple) => self.format_tuple(tuple, out)?,
            PropertyValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.format_value(item, out)?;
                }
                out.push(']');
            }
            PropertyValue::ImagePath(path) | PropertyValue::FontPath(path) => {
                out.push('"');
                out.push_str(&escape(path));
                out.push('"');
            }
            PropertyValue::LocalizedText(key) => {
                out.push('%');
                out.push_str(key);
            }
            PropertyValue::VariableRef(var) => out.push_str(&var.canonical_text()),
            PropertyValue::Spread(inner) => {
                out.push_str("...");
                self.format_value(inner, out)?;
            }
            PropertyValue::Expression(expr) => self.format_expression(expr, out)?,
            PropertyValue::Unknown(raw) => out.push_str(raw),
            PropertyValue::Null => out.push_str("null"),
        }
        Ok(())
    }

    fn format_style_reference(
        &self,
        reference: &StyleReference,
        out: &mut String,
    ) -> Result<(), ExportError> {
        match reference {
            StyleReference::Local { name } => out.push_str(&format!("@{}", name)),
            StyleReference::Imported { alias, name } => {
                out.push_str(&format!("${}.@{}", alias, name))
            }
            StyleReference::Spread { inner } => {
                out.push_str("...");
                self.format_style_reference(inner, out)?;
            }
            StyleReference::Inline { properties } => {
                out.push('(');
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key.as_str());
                    out.push_str(": ");
                    self.format_value(value, out)?;
                }
                out.push(')');
            }
        }
        Ok(())
    }

    fn format_tuple(&self, tuple: &TupleValue, out: &mut String) -> Result<(), ExportError> {
        out.push('(');
        for (i, entry) in tuple.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match entry {
                TupleEntry::Keyed { key, value } => {
                    out.push_str(key.as_str());
                    out.push_str(": ");
                    self.format_value(value, out)?;
                }
                TupleEntry::Spread { value } => {
                    out.push_str("...");
                    self.format_value(value, out)?;
                }
            }
        }
        out.push(')');
        Ok(())
    }

    /// Expressions reprint with the minimum parenthesization that preserves
    /// the tree: a lower-precedence child is always wrapped, and every
    /// same-precedence *right* child is wrapped: a right-nested tree can
    /// only have come from explicit parens, and `-`/`/` are not associative.
    fn format_expression(
        &self,
        expr: &ExpressionValue,
        out: &mut String,
    ) -> Result<(), ExportError> {
        self.format_operand(&expr.left, expr.op.precedence(), false, out)?;
        out.push(' ');
        out.push_str(expr.op.symbol());
        out.push(' ');
        self.format_operand(&expr.right, expr.op.precedence(), true, out)
    }

    fn format_operand(
        &self,
        value: &PropertyValue,
        parent_precedence: u8,
        is_right: bool,
        out: &mut String,
    ) -> Result<(), ExportError> {
        if let PropertyValue::Expression(child) = value {
            let precedence = child.op.precedence();
            let needs_parens =
                precedence < parent_precedence || (is_right && precedence == parent_precedence);
            if needs_parens {
                out.push('(');
                self.format_expression(child, out)?;
                out.push(')');
                return Ok(());
            }
            return self.format_expression(child, out);
        }
        self.format_value(value, out)
    }

    fn write_indent(&self, out: &mut String) {
        for _ in 0..self.indent_level {
            if self.config.use_tabs {
                out.push('\t');
            } else {
                for _ in 0..self.config.indent_width {
                    out.push(' ');
                }
            }
        }
    }
}

fn write_comment_text(text: &str, block: bool, out: &mut String) {
    if block {
        out.push_str(&format!("/*{}*/\n", text));
    } else {
        out.push_str(&format!("//{}\n", text));
    }
}

/// Integral values drop the trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
