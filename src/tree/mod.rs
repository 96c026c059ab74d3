//! # Box Tree
//!
//! The mutable layout tree. Nodes live in an arena and refer to each other by
//! [`NodeId`]; the parent link is a plain index, so there are no ownership
//! cycles. Layout rewrites the tree in one way only: a text node that spills
//! over a page bottom is replaced in its parent's child list by fragment
//! siblings. Replaced nodes stay in the arena but are no longer reachable
//! from the root.

use crate::layout::geometry::Geometry;
use crate::model::{self, NodeKind, TextValue};
use crate::style::Style;

/// Index of a node inside a [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Document,
    Page,
    VStack,
    HStack,
    Text,
    Image,
    CodeBlock,
}

impl ElementKind {
    pub fn is_container(self) -> bool {
        !matches!(self, ElementKind::Text | ElementKind::Image)
    }

    /// Children of these kinds flow left to right.
    pub fn is_horizontal(self) -> bool {
        self == ElementKind::HStack
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Document => "Document",
            ElementKind::Page => "Page",
            ElementKind::VStack => "VStack",
            ElementKind::HStack => "HStack",
            ElementKind::Text => "Text",
            ElementKind::Image => "Image",
            ElementKind::CodeBlock => "CodeBlock",
        }
    }
}

/// Leaf content, or the deferred source of a code block.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    None,
    Text(TextValue),
    Image(String),
    Code {
        language: String,
        source: String,
        materialized: bool,
    },
}

#[derive(Debug, Clone)]
pub struct BoxNode {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub parent: Option<NodeId>,
    pub style: Style,
    pub content: Content,
    pub children: Vec<NodeId>,
    /// Last computed geometry. `None` until the node is laid out.
    pub geometry: Option<Geometry>,
    /// Set on the pieces of a text node that was split across pages.
    pub fragment: bool,
}

impl BoxNode {
    pub fn new(kind: ElementKind, style: Style, content: Content) -> Self {
        Self {
            kind,
            id: None,
            parent: None,
            style,
            content,
            children: Vec::new(),
            geometry: None,
            fragment: false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(v) => v.as_str(),
            _ => None,
        }
    }
}

/// Arena of box nodes.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
}

impl BoxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, node: BoxNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &BoxNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut BoxNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&BoxNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn geometry(&self, id: NodeId) -> Option<Geometry> {
        self.node(id).geometry
    }

    // ── Construction helpers ───────────────────────────────────

    pub fn document(&mut self) -> NodeId {
        self.add(BoxNode::new(ElementKind::Document, Style::default(), Content::None))
    }

    pub fn page(&mut self, style: Style, children: Vec<NodeId>) -> NodeId {
        self.container(ElementKind::Page, style, children)
    }

    pub fn vstack(&mut self, style: Style, children: Vec<NodeId>) -> NodeId {
        self.container(ElementKind::VStack, style, children)
    }

    pub fn hstack(&mut self, style: Style, children: Vec<NodeId>) -> NodeId {
        self.container(ElementKind::HStack, style, children)
    }

    pub fn text(&mut self, content: impl Into<TextValue>, style: Style) -> NodeId {
        self.add(BoxNode::new(
            ElementKind::Text,
            style,
            Content::Text(content.into()),
        ))
    }

    pub fn image(&mut self, src: &str, style: Style) -> NodeId {
        self.add(BoxNode::new(
            ElementKind::Image,
            style,
            Content::Image(src.to_string()),
        ))
    }

    pub fn code_block(&mut self, language: &str, source: &str, style: Style) -> NodeId {
        self.add(BoxNode::new(
            ElementKind::CodeBlock,
            style,
            Content::Code {
                language: language.to_string(),
                source: source.to_string(),
                materialized: false,
            },
        ))
    }

    fn container(&mut self, kind: ElementKind, style: Style, children: Vec<NodeId>) -> NodeId {
        let id = self.add(BoxNode::new(kind, style, Content::None));
        self.set_children(id, children);
        id
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.node_mut(node).id = Some(id.to_string());
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Replace a node's child list. Dropped children are detached.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let old = std::mem::take(&mut self.node_mut(parent).children);
        for child in old {
            if self.node(child).parent == Some(parent) {
                self.node_mut(child).parent = None;
            }
        }
        for &child in &children {
            self.node_mut(child).parent = Some(parent);
        }
        self.node_mut(parent).children = children;
    }

    /// Put `replacements` where `old` sits in its parent's child list.
    pub fn replace_child(&mut self, old: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        let mut children = Vec::with_capacity(self.children(parent).len() + replacements.len());
        for &child in self.children(parent) {
            if child == old {
                children.extend_from_slice(replacements);
            } else {
                children.push(child);
            }
        }
        self.set_children(parent, children);
    }

    /// Shallow copy of a leaf: same kind, style and parent, no geometry.
    pub fn copy_leaf(&mut self, source: NodeId, content: Content) -> NodeId {
        let original = self.node(source);
        let mut copy = BoxNode::new(original.kind, original.style.clone(), content);
        copy.parent = original.parent;
        self.add(copy)
    }

    /// Nodes reachable from `root`, in document order (pre-order).
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Human-readable node label for errors and logs: `Text#intro` or `Text@12`.
    pub fn label(&self, id: NodeId) -> String {
        let node = self.node(id);
        match &node.id {
            Some(name) => format!("{}#{}", node.kind.name(), name),
            None => format!("{}@{}", node.kind.name(), id.0),
        }
    }

    /// Build a tree from the serialized model. Returns the tree and its Document root.
    pub fn from_model(document: &model::Document) -> (Self, NodeId) {
        let mut tree = BoxTree::new();
        let root = tree.document();
        for node in &document.children {
            let child = tree.add_model_node(node);
            tree.append_child(root, child);
        }
        (tree, root)
    }

    fn add_model_node(&mut self, node: &model::Node) -> NodeId {
        let (kind, content) = match &node.kind {
            NodeKind::Page => (ElementKind::Page, Content::None),
            NodeKind::VStack => (ElementKind::VStack, Content::None),
            NodeKind::HStack => (ElementKind::HStack, Content::None),
            NodeKind::Text { content } => (ElementKind::Text, Content::Text(content.clone())),
            NodeKind::Image { src } => (ElementKind::Image, Content::Image(src.clone())),
            NodeKind::CodeBlock { language, source } => (
                ElementKind::CodeBlock,
                Content::Code {
                    language: language.clone(),
                    source: source.clone(),
                    materialized: false,
                },
            ),
        };
        let mut box_node = BoxNode::new(kind, node.style.clone(), content);
        box_node.id = node.id.clone();
        let id = self.add(box_node);
        if kind.is_container() {
            for child in &node.children {
                let child = self.add_model_node(child);
                self.append_child(id, child);
            }
        } else if !node.children.is_empty() {
            log::warn!("{} ignores its {} children", self.label(id), node.children.len());
        }
        id
    }
}
