//! # Document Model
//!
//! The serialized input representation. A document is a list of top-level
//! nodes plus page configuration and metadata; each node has a kind, style
//! properties and children. This is what the CLI reads from JSON and what
//! [`crate::tree::BoxTree::from_model`] turns into a layout tree.
//!
//! Page is a first-class node kind: every Page node opens a fresh page.

use crate::style::Style;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The top-level nodes. Typically Page nodes, but any node kind works.
    #[serde(default)]
    pub children: Vec<Node>,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Page size and margins shared by every page.
    #[serde(default)]
    pub page: PageConfig,
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Page size and margins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub size: PageSize,

    /// Page margins in points (1/72 inch).
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

fn default_margin() -> Edges {
    Edges::uniform(54.0) // ~0.75 inch
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margin and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Edges {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// A node in the serialized document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// What kind of node this is.
    #[serde(flatten)]
    pub kind: NodeKind,

    /// Style properties for this node.
    #[serde(default)]
    pub style: Style,

    /// Child nodes (containers only).
    #[serde(default)]
    pub children: Vec<Node>,

    /// Stable identifier. Ids are recorded with the page they land on.
    #[serde(default)]
    pub id: Option<String>,
}

/// The different kinds of nodes in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// A page boundary. Content inside starts on a fresh page.
    Page,

    /// Children laid out top to bottom.
    VStack,

    /// Children laid out left to right, wrapping into rows.
    HStack,

    /// A text run. Numbers and booleans are accepted and coerced.
    Text { content: TextValue },

    /// An image from a file path, data URI or raw base64.
    Image { src: String },

    /// Source code, tokenized and styled at layout time.
    CodeBlock {
        #[serde(default = "default_language")]
        language: String,
        source: String,
    },
}

fn default_language() -> String {
    "plain".to_string()
}

/// A text value as it arrives from the input. Layout coerces it to a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl TextValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TextValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Replace a non-string value by its string form.
    pub fn coerce(&mut self) {
        if !matches!(self, TextValue::Str(_)) {
            *self = TextValue::Str(self.to_string());
        }
    }
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextValue::Str(s) => f.write_str(s),
            // 3.0 prints as "3", not "3.0"
            TextValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            TextValue::Number(n) => write!(f, "{}", n),
            TextValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for TextValue {
    fn from(s: &str) -> Self {
        TextValue::Str(s.to_string())
    }
}

impl From<String> for TextValue {
    fn from(s: String) -> Self {
        TextValue::Str(s)
    }
}

impl From<f64> for TextValue {
    fn from(n: f64) -> Self {
        TextValue::Number(n)
    }
}

impl Node {
    fn new(kind: NodeKind, style: Style, children: Vec<Node>) -> Self {
        Self {
            kind,
            style,
            children,
            id: None,
        }
    }

    pub fn page(style: Style, children: Vec<Node>) -> Self {
        Self::new(NodeKind::Page, style, children)
    }

    pub fn vstack(style: Style, children: Vec<Node>) -> Self {
        Self::new(NodeKind::VStack, style, children)
    }

    pub fn hstack(style: Style, children: Vec<Node>) -> Self {
        Self::new(NodeKind::HStack, style, children)
    }

    pub fn text(content: impl Into<TextValue>, style: Style) -> Self {
        Self::new(
            NodeKind::Text {
                content: content.into(),
            },
            style,
            vec![],
        )
    }

    pub fn image(src: &str, style: Style) -> Self {
        Self::new(
            NodeKind::Image {
                src: src.to_string(),
            },
            style,
            vec![],
        )
    }

    pub fn code_block(language: &str, source: &str, style: Style) -> Self {
        Self::new(
            NodeKind::CodeBlock {
                language: language.to_string(),
                source: source.to_string(),
            },
            style,
            vec![],
        )
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}
