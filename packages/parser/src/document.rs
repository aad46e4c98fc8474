//! The editable document model.
//!
//! Lowering turns the AST into a [`UIDocument`] whose property values may
//! still be symbolic (style references, variables, arithmetic). That raw
//! document is what the editor and exporter work on; the evaluator produces a
//! fully concrete copy of it for rendering. Nothing here is ever mutated in
//! place: edits build new trees that share untouched subtrees through `Arc`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use crate::ast::BinaryOp;

/// Durable synthetic identity assigned to every element at lowering time.
/// Editor deltas match on this, never on object identity or structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// User-facing element id: the `#Main` in `Group #Main { ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

/// Element type name (`Group`, `Button`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementType(pub String);

/// Property name key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(pub String);

macro_rules! string_newtype {
    ($t:ident) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_newtype!(NodeId);
string_newtype!(ElementId);
string_newtype!(ElementType);
string_newtype!(PropertyName);

/// Reserved element type for synthetic comment children.
pub const COMMENT_TYPE: &str = "#comment";
/// Reserved element type for `@Style #Id {}` / `$A.@S #Id {}` / `#Id {}` blocks.
pub const PREFIXED_TYPE: &str = "#prefixed";
/// Reserved element type for the synthetic multi-root wrapper.
pub const DOCUMENT_TYPE: &str = "#document";
/// Comment text property on `#comment` nodes.
pub const COMMENT_TEXT_PROP: &str = "#text";
/// Block-comment flag property on `#comment` nodes.
pub const COMMENT_BLOCK_PROP: &str = "#block";
/// Original prefix text property on `#prefixed` nodes.
pub const PREFIX_PROP: &str = "#prefix";

/// A parsed `.ui` document: root element tree, imports, named styles and
/// free-floating comments. Maps are insertion-ordered; the order is
/// load-bearing for export fidelity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIDocument {
    pub root: Arc<UIElement>,
    /// alias → import path, in declaration order.
    pub imports: IndexMap<String, String>,
    /// name → definition, in declaration order. Duplicate names are
    /// last-write-wins (an advisory warning is logged during lowering).
    pub styles: IndexMap<String, StyleDefinition>,
    pub comments: Vec<Comment>,
}

impl UIDocument {
    /// Look up an element anywhere in the tree by its durable node id.
    pub fn find(&self, id: &NodeId) -> Option<&UIElement> {
        self.root.find(id)
    }

    /// Top-level elements: the wrapper's children when the root is synthetic,
    /// otherwise the root itself.
    pub fn top_level(&self) -> Vec<&UIElement> {
        if self.root.is_wrapper() {
            self.root.children.iter().map(|c| c.as_ref()).collect()
        } else {
            vec![self.root.as_ref()]
        }
    }
}

/// One element of the interface tree. Immutable value type with structural
/// equality; children are shared through `Arc` so copy-on-write edits reuse
/// untouched subtrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIElement {
    pub node_id: NodeId,
    pub element_type: ElementType,
    /// Original engine-specific type when the parser canonicalized an alias
    /// (`TextButton` → `Button`); the exporter re-emits it verbatim.
    pub source_type: Option<ElementType>,
    pub id: Option<ElementId>,
    /// Ordered property map; keys unique, order significant for export.
    pub properties: IndexMap<PropertyName, PropertyValue>,
    pub children: Vec<Arc<UIElement>>,
}

impl UIElement {
    pub fn new(node_id: NodeId, element_type: impl Into<ElementType>) -> Self {
        Self {
            node_id,
            element_type: element_type.into(),
            source_type: None,
            id: None,
            properties: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn find(&self, id: &NodeId) -> Option<&UIElement> {
        if &self.node_id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(&PropertyName::from(name))
    }

    pub fn is_comment(&self) -> bool {
        self.element_type.as_str() == COMMENT_TYPE
    }

    pub fn is_prefixed(&self) -> bool {
        self.element_type.as_str() == PREFIXED_TYPE
    }

    pub fn is_wrapper(&self) -> bool {
        self.element_type.as_str() == DOCUMENT_TYPE
    }
}

/// Structural equality: node ids are synthetic identity, not structure, so
/// they are ignored; property order IS structure and compares ordered
/// (IndexMap's own `PartialEq` would not).
impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type
            && self.source_type == other.source_type
            && self.id == other.id
            && ordered_eq(&self.properties, &other.properties)
            && self.children == other.children
    }
}

impl PartialEq for UIDocument {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && ordered_eq(&self.imports, &other.imports)
            && ordered_eq(&self.styles, &other.styles)
            && self.comments == other.comments
    }
}

fn ordered_eq<K: PartialEq, V: PartialEq>(a: &IndexMap<K, V>, b: &IndexMap<K, V>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// The closed value union. The exporter dispatches over every variant with an
/// exhaustive `match`; adding a variant is a compile error there until it is
/// handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    /// Stores the literal figure: `50%` is `Percent(50.0)`.
    Percent(f64),
    Boolean(bool),
    Color(ColorValue),
    Anchor(AnchorValue),
    Style(StyleReference),
    Tuple(TupleValue),
    List(Vec<PropertyValue>),
    ImagePath(String),
    FontPath(String),
    LocalizedText(String),
    VariableRef(VariableRefValue),
    Spread(Box<PropertyValue>),
    Expression(Box<ExpressionValue>),
    /// Verbatim source text kept for forward compatibility; the exporter
    /// splices it back unchanged.
    Unknown(String),
    Null,
}

impl PropertyValue {
    /// Numeric quantity for arithmetic: numbers directly, percents coerced to
    /// their literal figure.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Percent(p) => Some(*p),
            _ => None,
        }
    }

    /// Canonical source text when this value is a pure reference
    /// (`@Name`, `$Alias.@Name.Member`, optionally spread). Style-use
    /// property entries are keyed by this text.
    pub fn canonical_reference_text(&self) -> Option<String> {
        match self {
            PropertyValue::Style(reference) => reference.canonical_text(),
            PropertyValue::VariableRef(var) => Some(var.canonical_text()),
            PropertyValue::Spread(inner) => inner
                .canonical_reference_text()
                .map(|text| format!("...{}", text)),
            _ => None,
        }
    }

    /// Stable kind name, used by schema discovery.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "Text",
            PropertyValue::Number(_) => "Number",
            PropertyValue::Percent(_) => "Percent",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Color(_) => "Color",
            PropertyValue::Anchor(_) => "Anchor",
            PropertyValue::Style(_) => "Style",
            PropertyValue::Tuple(_) => "Tuple",
            PropertyValue::List(_) => "List",
            PropertyValue::ImagePath(_) => "ImagePath",
            PropertyValue::FontPath(_) => "FontPath",
            PropertyValue::LocalizedText(_) => "LocalizedText",
            PropertyValue::VariableRef(_) => "VariableRef",
            PropertyValue::Spread(_) => "Spread",
            PropertyValue::Expression(_) => "Expression",
            PropertyValue::Unknown(_) => "Unknown",
            PropertyValue::Null => "Null",
        }
    }
}

/// `#RRGGBB` with optional alpha. The hex digits are stored exactly as
/// written so `#ff0000(0.5)` round-trips byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorValue {
    pub rgb: String,
    pub alpha: Option<f64>,
}

/// Anchor layout value: ordered optional directional fields. Field values are
/// full property values, so expressions and references resolve like anywhere
/// else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorValue {
    pub fields: Vec<(AnchorField, PropertyValue)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorField {
    Left,
    Top,
    Right,
    Bottom,
    Width,
    Height,
}

impl AnchorField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorField::Left => "Left",
            AnchorField::Top => "Top",
            AnchorField::Right => "Right",
            AnchorField::Bottom => "Bottom",
            AnchorField::Width => "Width",
            AnchorField::Height => "Height",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Left" => Some(AnchorField::Left),
            "Top" => Some(AnchorField::Top),
            "Right" => Some(AnchorField::Right),
            "Bottom" => Some(AnchorField::Bottom),
            "Width" => Some(AnchorField::Width),
            "Height" => Some(AnchorField::Height),
            _ => None,
        }
    }
}

/// Reference to a named style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StyleReference {
    Local { name: String },
    Imported { alias: String, name: String },
    Spread { inner: Box<StyleReference> },
    Inline { properties: IndexMap<PropertyName, PropertyValue> },
}

impl StyleReference {
    /// Canonical source text of the reference; inline bundles have none.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            StyleReference::Local { name } => Some(format!("@{}", name)),
            StyleReference::Imported { alias, name } => Some(format!("${}.@{}", alias, name)),
            StyleReference::Spread { inner } => {
                inner.canonical_text().map(|t| format!("...{}", t))
            }
            StyleReference::Inline { .. } => None,
        }
    }
}

/// Variable reference with an access path: `@Theme.Primary` is
/// `{ alias: None, path: ["Theme", "Primary"] }`, `$Gui.@Theme.Primary` is
/// `{ alias: Some("Gui"), path: ["Theme", "Primary"] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRefValue {
    pub alias: Option<String>,
    pub path: Vec<String>,
}

impl VariableRefValue {
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        if let Some(alias) = &self.alias {
            out.push('$');
            out.push_str(alias);
            out.push('.');
        }
        out.push('@');
        out.push_str(&self.path.join("."));
        out
    }
}

/// Binary arithmetic node; stays symbolic when an operand is non-numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionValue {
    pub left: PropertyValue,
    pub op: BinaryOp,
    pub right: PropertyValue,
}

/// Ordered tuple value: keyed entries interleaved with spreads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleValue {
    pub entries: Vec<TupleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TupleEntry {
    Keyed {
        key: PropertyName,
        value: PropertyValue,
    },
    Spread {
        value: PropertyValue,
    },
}

impl TupleValue {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find_map(|e| match e {
            TupleEntry::Keyed { key: k, value } if k.as_str() == key => Some(value),
            _ => None,
        })
    }
}

/// A named, reusable style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub name: String,
    pub body: StyleBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleBody {
    /// Element template: type + properties + children.
    Element(Arc<UIElement>),
    /// Constructor form: `Font(Family: "Serif", Size: 18)`.
    Constructor {
        type_name: String,
        properties: IndexMap<PropertyName, PropertyValue>,
    },
    /// Plain property bundle.
    Tuple(TupleValue),
    /// Any scalar value, including symbolic ones.
    Scalar(PropertyValue),
}

/// A free-floating comment retained on the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub block: bool,
    pub anchor: CommentAnchor,
}

/// Re-export anchor for document-level comments. Comments between sibling
/// statements live in the tree as `#comment` children instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CommentAnchor {
    FileHeader,
    FileFooter,
    Import { alias: String },
    Style { name: String },
    Element { index: usize },
}
