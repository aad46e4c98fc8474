//! Lowering: AST → raw [`UIDocument`].
//!
//! A deterministic structural transform. Source positions are dropped here;
//! the only surviving source text is the verbatim payload of `Unknown`
//! values. Every element receives a durable `NodeId` from the document's
//! [`IdGenerator`], in AST order, so an unchanged file always lowers to the
//! same identities.

use crate::ast::*;
use crate::document::*;
use crate::id_generator::IdGenerator;
use std::sync::Arc;
use tracing::warn;

/// Lower a parsed document. `path` seeds node-id generation.
pub fn lower_document(ast: &DocumentNode, path: &str) -> UIDocument {
    let mut gen = IdGenerator::new(path);
    let mut imports = indexmap::IndexMap::new();
    let mut styles = indexmap::IndexMap::new();
    let mut roots: Vec<Arc<UIElement>> = Vec::new();
    let mut comments = Vec::new();

    for item in &ast.items {
        match item {
            DocumentItem::Import(import) => {
                if imports
                    .insert(import.alias.clone(), import.path.clone())
                    .is_some()
                {
                    warn!(alias = %import.alias, "duplicate import alias, last write wins");
                }
            }
            DocumentItem::Style(style) => {
                let definition = lower_style_definition(style, &mut gen);
                if styles.insert(style.name.clone(), definition).is_some() {
                    warn!(name = %style.name, "duplicate style definition, last write wins");
                }
            }
            DocumentItem::Element(element) => {
                roots.push(Arc::new(lower_element(element, &mut gen)));
            }
            DocumentItem::Comment(comment) => {
                comments.push(Comment {
                    text: comment.text.clone(),
                    block: comment.block,
                    anchor: lower_attachment(&comment.attachment),
                });
            }
        }
    }

    let root = if roots.len() == 1 {
        roots.pop().unwrap()
    } else {
        // Zero or many top-level elements get a synthetic wrapper; the
        // exporter flattens it back out
        let mut wrapper = UIElement::new(gen.next_id(), DOCUMENT_TYPE);
        wrapper.children = roots;
        Arc::new(wrapper)
    };

    UIDocument {
        root,
        imports,
        styles,
        comments,
    }
}

fn lower_attachment(attachment: &CommentAttachment) -> CommentAnchor {
    match attachment {
        CommentAttachment::FileHeader => CommentAnchor::FileHeader,
        CommentAttachment::FileFooter | CommentAttachment::Sibling => CommentAnchor::FileFooter,
        CommentAttachment::Import { alias } => CommentAnchor::Import {
            alias: alias.clone(),
        },
        CommentAttachment::Style { name } => CommentAnchor::Style { name: name.clone() },
        CommentAttachment::Element { index } => CommentAnchor::Element { index: *index },
    }
}

fn lower_style_definition(node: &StyleDefinitionNode, gen: &mut IdGenerator) -> StyleDefinition {
    let body = match &node.body {
        StyleBodyNode::Tuple(tuple) => StyleBody::Tuple(lower_tuple(tuple)),
        StyleBodyNode::Constructor {
            type_name,
            properties,
            ..
        } => {
            let mut map = indexmap::IndexMap::new();
            for property in properties {
                map.insert(
                    PropertyName::new(property.name.clone()),
                    lower_value(&property.value, Some(property.name.as_str())),
                );
            }
            StyleBody::Constructor {
                type_name: type_name.clone(),
                properties: map,
            }
        }
        StyleBodyNode::Element(element) => StyleBody::Element(Arc::new(lower_element(element, gen))),
        StyleBodyNode::Scalar(value) => StyleBody::Scalar(lower_value(value, None)),
    };
    StyleDefinition {
        name: node.name.clone(),
        body,
    }
}

fn lower_element(node: &ElementNode, gen: &mut IdGenerator) -> UIElement {
    let mut element = match &node.prefix {
        // The three prefixed surface forms all become one reserved node kind;
        // the `#prefix` property carries the original prefix text so the
        // exporter can regenerate the exact source syntax
        Some(prefix) => {
            let mut element = UIElement::new(gen.next_id(), PREFIXED_TYPE);
            let text = match prefix {
                ElementPrefix::Style(reference) => reference_text(reference),
                ElementPrefix::IdOnly => String::new(),
            };
            element
                .properties
                .insert(PropertyName::from(PREFIX_PROP), PropertyValue::Text(text));
            element
        }
        None => {
            let mut element = UIElement::new(gen.next_id(), node.type_name.as_str());
            element.source_type = node.source_type.as_deref().map(ElementType::from);
            element
        }
    };
    element.id = node.id.as_deref().map(ElementId::from);

    let mut use_counter = 0usize;
    for item in &node.body {
        match item {
            ElementItem::Property(property) => {
                element.properties.insert(
                    PropertyName::new(property.name.clone()),
                    lower_value(&property.value, Some(property.name.as_str())),
                );
            }
            ElementItem::ScopedStyle { name, value, .. } => {
                // Scoped declarations ride in the property map under the
                // reserved '@' prefix so tree operations treat them uniformly
                element.properties.insert(
                    PropertyName::new(format!("@{}", name)),
                    lower_value(value, None),
                );
            }
            ElementItem::StyleUse { spread, value, .. } => {
                let lowered = lower_style_use(value, *spread);
                let key = lowered.canonical_reference_text().unwrap_or_else(|| {
                    use_counter += 1;
                    format!("#use-{}", use_counter)
                });
                element.properties.insert(PropertyName::new(key), lowered);
            }
            ElementItem::Child(child) => {
                element.children.push(Arc::new(lower_element(child, gen)));
            }
            ElementItem::Comment(comment) => {
                element.children.push(Arc::new(comment_child(comment, gen)));
            }
        }
    }

    element
}

/// Synthetic `#comment` child keeping a body comment at its exact position
/// among siblings.
fn comment_child(comment: &CommentNode, gen: &mut IdGenerator) -> UIElement {
    let mut element = UIElement::new(gen.next_id(), COMMENT_TYPE);
    element.properties.insert(
        PropertyName::from(COMMENT_TEXT_PROP),
        PropertyValue::Text(comment.text.clone()),
    );
    element.properties.insert(
        PropertyName::from(COMMENT_BLOCK_PROP),
        PropertyValue::Boolean(comment.block),
    );
    element
}

fn lower_style_use(value: &ValueNode, spread: bool) -> PropertyValue {
    let inner = match value {
        ValueNode::Reference(reference) => lower_reference(reference),
        ValueNode::Tuple(tuple) => {
            let has_spread = tuple
                .entries
                .iter()
                .any(|e| matches!(e, TupleEntryNode::Spread { .. }));
            if has_spread {
                // An inline bundle with nested spreads stays a plain tuple so
                // the evaluator's spread merging applies to it
                lower_value(value, None)
            } else {
                let mut properties = indexmap::IndexMap::new();
                for entry in &tuple.entries {
                    if let TupleEntryNode::Keyed { key, value } = entry {
                        properties
                            .insert(PropertyName::new(key.clone()), lower_value(value, Some(key.as_str())));
                    }
                }
                PropertyValue::Style(StyleReference::Inline { properties })
            }
        }
        other => lower_value(other, None),
    };
    wrap_spread(inner, spread)
}

fn wrap_spread(value: PropertyValue, spread: bool) -> PropertyValue {
    if !spread {
        return value;
    }
    match value {
        PropertyValue::Style(reference) => PropertyValue::Style(StyleReference::Spread {
            inner: Box::new(reference),
        }),
        other => PropertyValue::Spread(Box::new(other)),
    }
}

fn lower_reference(reference: &ReferenceNode) -> PropertyValue {
    if reference.segments.is_empty() {
        let style_ref = match &reference.alias {
            Some(alias) => StyleReference::Imported {
                alias: alias.clone(),
                name: reference.name.clone(),
            },
            None => StyleReference::Local {
                name: reference.name.clone(),
            },
        };
        PropertyValue::Style(style_ref)
    } else {
        let mut path = vec![reference.name.clone()];
        path.extend(reference.segments.iter().cloned());
        PropertyValue::VariableRef(VariableRefValue {
            alias: reference.alias.clone(),
            path,
        })
    }
}

fn reference_text(reference: &ReferenceNode) -> String {
    let mut out = String::new();
    if let Some(alias) = &reference.alias {
        out.push('$');
        out.push_str(alias);
        out.push('.');
    }
    out.push('@');
    out.push_str(&reference.name);
    for segment in &reference.segments {
        out.push('.');
        out.push_str(segment);
    }
    out
}

/// Lower one value node. `property_name` steers anchor recognition and
/// image/font classification stays extension-based.
pub fn lower_value(node: &ValueNode, property_name: Option<&str>) -> PropertyValue {
    match node {
        ValueNode::Str { value, .. } => classify_string(value),
        ValueNode::Number { value, .. } => PropertyValue::Number(*value),
        ValueNode::Percent { value, .. } => PropertyValue::Percent(*value),
        ValueNode::Boolean { value, .. } => PropertyValue::Boolean(*value),
        ValueNode::Color { rgb, alpha, .. } => PropertyValue::Color(ColorValue {
            rgb: rgb.clone(),
            alpha: *alpha,
        }),
        // Bare identifiers are engine-defined enum values this core does not
        // interpret; the verbatim payload re-exports unquoted
        ValueNode::Identifier { name, .. } => PropertyValue::Unknown(name.clone()),
        ValueNode::Localized { key, .. } => PropertyValue::LocalizedText(key.clone()),
        ValueNode::Null { .. } => PropertyValue::Null,
        ValueNode::Tuple(tuple) => {
            if property_name == Some("Anchor") {
                if let Some(anchor) = try_anchor(tuple) {
                    return PropertyValue::Anchor(anchor);
                }
            }
            PropertyValue::Tuple(lower_tuple(tuple))
        }
        ValueNode::List { items, .. } => {
            PropertyValue::List(items.iter().map(|v| lower_value(v, None)).collect())
        }
        ValueNode::Reference(reference) => lower_reference(reference),
        ValueNode::Spread { inner, .. } => wrap_spread(lower_value(inner, None), true),
        ValueNode::Binary {
            left, op, right, ..
        } => PropertyValue::Expression(Box::new(ExpressionValue {
            left: lower_value(left, None),
            op: *op,
            right: lower_value(right, None),
        })),
        ValueNode::Raw { text, .. } => PropertyValue::Unknown(text.clone()),
    }
}

fn lower_tuple(tuple: &TupleNode) -> TupleValue {
    let entries = tuple
        .entries
        .iter()
        .map(|entry| match entry {
            TupleEntryNode::Keyed { key, value } => TupleEntry::Keyed {
                key: PropertyName::new(key.clone()),
                value: lower_value(value, Some(key.as_str())),
            },
            TupleEntryNode::Spread { value } => TupleEntry::Spread {
                value: lower_value(value, None),
            },
        })
        .collect();
    TupleValue { entries }
}

/// A tuple under the `Anchor` property whose keys are all directional fields
/// becomes an anchor, original field order preserved.
fn try_anchor(tuple: &TupleNode) -> Option<AnchorValue> {
    let mut fields = Vec::with_capacity(tuple.entries.len());
    for entry in &tuple.entries {
        match entry {
            TupleEntryNode::Keyed { key, value } => {
                let field = AnchorField::parse(key)?;
                fields.push((field, lower_value(value, None)));
            }
            TupleEntryNode::Spread { .. } => return None,
        }
    }
    Some(AnchorValue { fields })
}

fn classify_string(value: &str) -> PropertyValue {
    let lower = value.to_ascii_lowercase();
    let extension = lower.rsplit('.').next().unwrap_or("");
    if lower.contains('.') {
        match extension {
            "png" | "jpg" | "jpeg" | "tga" | "dds" | "bmp" => {
                return PropertyValue::ImagePath(value.to_string())
            }
            "ttf" | "otf" | "fnt" => return PropertyValue::FontPath(value.to_string()),
            _ => {}
        }
    }
    PropertyValue::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ast;

    fn lower(source: &str) -> UIDocument {
        let (ast, errors) = parse_ast(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        lower_document(&ast, "/test.ui")
    }

    #[test]
    fn test_single_root_is_not_wrapped() {
        let doc = lower("Group #Main { Width: 10; }");
        assert_eq!(doc.root.element_type.as_str(), "Group");
    }

    #[test]
    fn test_multiple_roots_get_wrapper() {
        let doc = lower("Group #A { } Group #B { }");
        assert!(doc.root.is_wrapper());
        assert_eq!(doc.root.children.len(), 2);
    }

    #[test]
    fn test_node_ids_are_deterministic() {
        let a = lower("Group { Label #L { } }");
        let b = lower("Group { Label #L { } }");
        assert_eq!(a.root.node_id, b.root.node_id);
        assert_eq!(a.root.children[0].node_id, b.root.children[0].node_id);
    }

    #[test]
    fn test_symbolic_values_stay_symbolic() {
        let doc = lower("@Size = 64; Group #Main { Width: @Size; }");
        let width = doc.root.property("Width").unwrap();
        assert!(matches!(
            width,
            PropertyValue::Style(StyleReference::Local { name }) if name == "Size"
        ));
    }

    #[test]
    fn test_scoped_style_becomes_reserved_property() {
        let doc = lower("Group { @Pad = 4; }");
        assert!(matches!(
            doc.root.property("@Pad"),
            Some(PropertyValue::Number(n)) if *n == 4.0
        ));
    }

    #[test]
    fn test_style_use_key_is_canonical_text() {
        let doc = lower("Group { ...$Gui.@Card; }");
        let (key, value) = doc.root.properties.get_index(0).unwrap();
        assert_eq!(key.as_str(), "...$Gui.@Card");
        assert!(matches!(
            value,
            PropertyValue::Style(StyleReference::Spread { .. })
        ));
    }

    #[test]
    fn test_prefixed_element_lowering() {
        let doc = lower("Group { $Gui.@Card #Box { } }");
        let child = &doc.root.children[0];
        assert!(child.is_prefixed());
        assert!(matches!(
            child.property(PREFIX_PROP),
            Some(PropertyValue::Text(t)) if t == "$Gui.@Card"
        ));
        assert_eq!(child.id.as_ref().map(|i| i.as_str()), Some("Box"));
    }

    #[test]
    fn test_comment_child_between_siblings() {
        let doc = lower("Group { Label #A { } // mid\n Label #B { } }");
        assert_eq!(doc.root.children.len(), 3);
        assert!(doc.root.children[1].is_comment());
    }

    #[test]
    fn test_anchor_recognition() {
        let doc = lower("Group { Anchor: (Left: 10, Top: 20); }");
        match doc.root.property("Anchor").unwrap() {
            PropertyValue::Anchor(anchor) => {
                assert_eq!(anchor.fields.len(), 2);
                assert_eq!(anchor.fields[0].0, AnchorField::Left);
            }
            other => panic!("expected anchor, got {:?}", other),
        }
    }

    #[test]
    fn test_non_anchor_tuple_stays_tuple() {
        let doc = lower("Group { Anchor: (Left: 10, Weird: 1); }");
        assert!(matches!(
            doc.root.property("Anchor"),
            Some(PropertyValue::Tuple(_))
        ));
    }

    #[test]
    fn test_string_classification() {
        let doc = lower(
            "Group { Icon: \"icons/save.png\"; Font: \"fonts/main.ttf\"; Title: \"Save\"; }",
        );
        assert!(matches!(
            doc.root.property("Icon"),
            Some(PropertyValue::ImagePath(_))
        ));
        assert!(matches!(
            doc.root.property("Font"),
            Some(PropertyValue::FontPath(_))
        ));
        assert!(matches!(
            doc.root.property("Title"),
            Some(PropertyValue::Text(_))
        ));
    }

    #[test]
    fn test_duplicate_style_last_write_wins() {
        let doc = lower("@A = 1; @A = 2;");
        match &doc.styles.get("A").unwrap().body {
            StyleBody::Scalar(PropertyValue::Number(n)) => assert_eq!(*n, 2.0),
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_ref_with_path() {
        let doc = lower("Group { Color: $Gui.@Theme.Primary; }");
        match doc.root.property("Color").unwrap() {
            PropertyValue::VariableRef(var) => {
                assert_eq!(var.alias.as_deref(), Some("Gui"));
                assert_eq!(var.path, vec!["Theme", "Primary"]);
            }
            other => panic!("expected variable ref, got {:?}", other),
        }
    }
}
