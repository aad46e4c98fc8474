use crate::tokenizer::Position;
use serde::{Deserialize, Serialize};

/// Root document node: top-level constructs in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub items: Vec<DocumentItem>,
}

/// One top-level construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentItem {
    Import(ImportNode),
    Style(StyleDefinitionNode),
    Element(ElementNode),
    Comment(CommentNode),
}

/// Import statement: `$Alias = "path/to/file.ui";`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportNode {
    pub alias: String,
    pub path: String,
    pub position: Position,
}

/// Named style definition: `@Name = <body>;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinitionNode {
    pub name: String,
    pub body: StyleBodyNode,
    pub position: Position,
}

/// The right-hand side of a style definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleBodyNode {
    /// `@Card = (Padding: 4, Color: #ffffff);`
    Tuple(TupleNode),

    /// `@Title = Font(Family: "Serif", Size: 18);`
    Constructor {
        type_name: String,
        properties: Vec<PropertyNode>,
        position: Position,
    },

    /// `@Header = Group { Height: 32; };`, an element template
    Element(Box<ElementNode>),

    /// `@Size = 64;`, any scalar value, including expressions
    Scalar(ValueNode),
}

/// Element node: `Type #id { ... }`, plus the prefixed surface forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    /// Canonical element type (after engine-alias mapping).
    pub type_name: String,

    /// Original type name when it was canonicalized, for exact re-export.
    pub source_type: Option<String>,

    /// Set for `@Style #Id { ... }`, `$Alias.@Name #Id { ... }` and
    /// `#Id { ... }` blocks, which have no plain type identifier.
    pub prefix: Option<ElementPrefix>,

    pub id: Option<String>,
    pub body: Vec<ElementItem>,
    pub position: Position,
}

/// The leading reference of a prefixed element block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementPrefix {
    /// `@Style #Id { ... }` or `$Alias.@Name #Id { ... }`
    Style(ReferenceNode),

    /// `#Id { ... }`
    IdOnly,
}

/// One statement inside an element body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementItem {
    /// `Name: Value;`
    Property(PropertyNode),

    /// `@Ref;`, `...@Ref;`, `$Alias.@Ref;` or an inline `(K: V);` bundle
    StyleUse {
        spread: bool,
        value: ValueNode,
        position: Position,
    },

    /// `@Name = Value;`, an element-scoped style declaration
    ScopedStyle {
        name: String,
        value: ValueNode,
        position: Position,
    },

    Child(ElementNode),
    Comment(CommentNode),
}

/// `Name: Value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode {
    pub name: String,
    pub value: ValueNode,
    pub position: Position,
}

/// A property value literal or composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValueNode {
    Str {
        value: String,
        position: Position,
    },
    Number {
        value: f64,
        position: Position,
    },
    Percent {
        value: f64,
        position: Position,
    },
    Boolean {
        value: bool,
        position: Position,
    },
    /// `#RRGGBB` with optional `(alpha)`; digits kept exactly as written.
    Color {
        rgb: String,
        alpha: Option<f64>,
        position: Position,
    },
    /// Bare identifier, e.g. enum-like values: `Orientation: Horizontal;`
    Identifier {
        name: String,
        position: Position,
    },
    /// `%menu.title`
    Localized {
        key: String,
        position: Position,
    },
    Null {
        position: Position,
    },
    Tuple(TupleNode),
    List {
        items: Vec<ValueNode>,
        position: Position,
    },
    /// `@Name`, `@Name.Member`, `$Alias.@Name.Member`
    Reference(ReferenceNode),
    /// `...<value>`
    Spread {
        inner: Box<ValueNode>,
        position: Position,
    },
    /// `left <op> right`
    Binary {
        left: Box<ValueNode>,
        op: BinaryOp,
        right: Box<ValueNode>,
        position: Position,
    },
    /// Verbatim source text the parser could not classify; round-trips as-is.
    Raw {
        text: String,
        position: Position,
    },
}

impl ValueNode {
    pub fn position(&self) -> Position {
        match self {
            ValueNode::Str { position, .. }
            | ValueNode::Number { position, .. }
            | ValueNode::Percent { position, .. }
            | ValueNode::Boolean { position, .. }
            | ValueNode::Color { position, .. }
            | ValueNode::Identifier { position, .. }
            | ValueNode::Localized { position, .. }
            | ValueNode::Null { position }
            | ValueNode::List { position, .. }
            | ValueNode::Spread { position, .. }
            | ValueNode::Binary { position, .. }
            | ValueNode::Raw { position, .. } => *position,
            ValueNode::Tuple(t) => t.position,
            ValueNode::Reference(r) => r.position,
        }
    }
}

/// Style or variable reference: `@Name.Seg…` local, `$Alias.@Name.Seg…` imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub alias: Option<String>,
    pub name: String,
    pub segments: Vec<String>,
    pub position: Position,
}

/// Ordered tuple literal; entries are keyed or spreads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleNode {
    pub entries: Vec<TupleEntryNode>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TupleEntryNode {
    Keyed { key: String, value: ValueNode },
    Spread { value: ValueNode },
}

/// A comment with the construct it attaches to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    /// Text without the `//` or `/* */` delimiters.
    pub text: String,
    pub block: bool,
    pub attachment: CommentAttachment,
    pub position: Position,
}

/// Where a comment belongs for re-export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommentAttachment {
    /// Before the first top-level construct.
    FileHeader,
    /// After the last top-level construct.
    FileFooter,
    Import { alias: String },
    Style { name: String },
    /// Top-level element, addressed by its position among roots.
    Element { index: usize },
    /// Sits strictly between two sibling statements inside a body; lowered to
    /// a synthetic comment child so its relative position never drifts.
    Sibling,
}

/// Arithmetic operators, `*`/`/` bind tighter than `+`/`-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}
