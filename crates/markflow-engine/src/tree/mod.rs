//! # Document Tree
//!
//! The tree every pipeline stage works on: the scanner produces it, plugins
//! rewrite it, the printer turns it back into text.
//!
//! A [`Node`] is a kind ([`NodeKind`], which carries the kind-specific
//! attributes), an optional leaf value, ordered children, an optional source
//! [`Position`] and an open [`Data`] sidecar. All fields are public so
//! plugins can restructure freely; [`Node::check`] reports anything that
//! breaks the shape the printer relies on.
//!
//! ## Ownership
//!
//! A node belongs to exactly one tree, and a tree to exactly one
//! [`VFile`](crate::VFile). Moving a subtree somewhere else takes it out of
//! its old parent; keeping it in both places takes a `clone()`, which is a
//! deep copy. Nothing is ever shared between two documents.

mod visit;

pub use visit::{Action, any, is, visit, visit_mut};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of node kinds, without attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Root,
    Heading,
    Paragraph,
    Text,
    Emphasis,
    Strong,
    List,
    ListItem,
    Link,
    Image,
    CodeBlock,
    InlineCode,
    Break,
    BlockQuote,
    ThematicBreak,
}

impl NodeType {
    /// Kinds that carry a `value` instead of children.
    pub fn is_leaf(self) -> bool {
        matches!(self, Self::Text | Self::InlineCode | Self::CodeBlock)
    }

    /// Kinds that may have children.
    pub fn is_parent(self) -> bool {
        matches!(
            self,
            Self::Root
                | Self::Heading
                | Self::Paragraph
                | Self::Emphasis
                | Self::Strong
                | Self::List
                | Self::ListItem
                | Self::Link
                | Self::BlockQuote
        )
    }

    /// Kinds that live directly in a root, block quote or list item.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Heading
                | Self::Paragraph
                | Self::List
                | Self::CodeBlock
                | Self::BlockQuote
                | Self::ThematicBreak
        )
    }

    /// Kinds that live in headings, paragraphs and other inlines.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Emphasis
                | Self::Strong
                | Self::Link
                | Self::Image
                | Self::InlineCode
                | Self::Break
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A node kind together with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Heading {
        /// 1 to 6
        depth: u8,
    },
    Paragraph,
    Text,
    Emphasis,
    Strong,
    List {
        ordered: bool,
        /// Number of the first item of an ordered list
        start: Option<u32>,
        /// Loose list: blank lines between items or item blocks
        spread: bool,
    },
    ListItem,
    Link {
        destination: String,
        title: Option<String>,
    },
    Image {
        destination: String,
        title: Option<String>,
        alt: String,
    },
    CodeBlock {
        lang: Option<String>,
        meta: Option<String>,
    },
    InlineCode,
    Break,
    BlockQuote,
    ThematicBreak,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Root => NodeType::Root,
            Self::Heading { .. } => NodeType::Heading,
            Self::Paragraph => NodeType::Paragraph,
            Self::Text => NodeType::Text,
            Self::Emphasis => NodeType::Emphasis,
            Self::Strong => NodeType::Strong,
            Self::List { .. } => NodeType::List,
            Self::ListItem => NodeType::ListItem,
            Self::Link { .. } => NodeType::Link,
            Self::Image { .. } => NodeType::Image,
            Self::CodeBlock { .. } => NodeType::CodeBlock,
            Self::InlineCode => NodeType::InlineCode,
            Self::Break => NodeType::Break,
            Self::BlockQuote => NodeType::BlockQuote,
            Self::ThematicBreak => NodeType::ThematicBreak,
        }
    }
}

/// A place in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// 0-based byte offset
    pub offset: usize,
}

impl Point {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source span of a node; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Byte range of the span.
    pub fn span(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    pub fn contains(&self, other: &Position) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A namespaced sidecar key, `"namespace:field"`.
///
/// Plugins use their own name as the namespace so keys never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataKey(String);

impl DataKey {
    pub fn new(namespace: &str, field: &str) -> Self {
        Self(format!("{namespace}:{field}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0
            .split_once(':')
            .map_or(self.0.as_str(), |(namespace, _)| namespace)
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Open sidecar map attached to nodes and files.
///
/// The core never reads it and the printer never writes it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data(BTreeMap<String, Value>);

impl Data {
    pub fn get(&self, key: &DataKey) -> Option<&Value> {
        self.0.get(key.as_str())
    }

    pub fn insert(&mut self, key: DataKey, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.0, value.into())
    }

    pub fn remove(&mut self, key: &DataKey) -> Option<Value> {
        self.0.remove(key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// `None` for nodes that did not come from the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Data::is_empty")]
    pub data: Data,
}

impl Node {
    /// A synthetic node: no value, no children, no position.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            value: None,
            children: Vec::new(),
            position: None,
            data: Data::default(),
        }
    }

    fn parent(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    fn leaf(kind: NodeKind, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(kind)
        }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::Root, children)
    }

    pub fn heading(depth: u8, children: Vec<Node>) -> Self {
        Self::parent(NodeKind::Heading { depth }, children)
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::Paragraph, children)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text, value)
    }

    pub fn emphasis(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::Emphasis, children)
    }

    pub fn strong(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::Strong, children)
    }

    /// A tight list; set `spread` on the kind for a loose one.
    pub fn list(ordered: bool, start: Option<u32>, children: Vec<Node>) -> Self {
        Self::parent(
            NodeKind::List {
                ordered,
                start,
                spread: false,
            },
            children,
        )
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::ListItem, children)
    }

    pub fn link(destination: impl Into<String>, title: Option<String>, children: Vec<Node>) -> Self {
        Self::parent(
            NodeKind::Link {
                destination: destination.into(),
                title,
            },
            children,
        )
    }

    pub fn image(
        destination: impl Into<String>,
        title: Option<String>,
        alt: impl Into<String>,
    ) -> Self {
        Self::new(NodeKind::Image {
            destination: destination.into(),
            title,
            alt: alt.into(),
        })
    }

    pub fn code_block(lang: Option<String>, meta: Option<String>, value: impl Into<String>) -> Self {
        Self::leaf(NodeKind::CodeBlock { lang, meta }, value)
    }

    pub fn inline_code(value: impl Into<String>) -> Self {
        Self::leaf(NodeKind::InlineCode, value)
    }

    pub fn hard_break() -> Self {
        Self::new(NodeKind::Break)
    }

    pub fn block_quote(children: Vec<Node>) -> Self {
        Self::parent(NodeKind::BlockQuote, children)
    }

    pub fn thematic_break() -> Self {
        Self::new(NodeKind::ThematicBreak)
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_data(mut self, key: DataKey, value: impl Into<Value>) -> Self {
        self.data.insert(key, value);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is(&self, kind: NodeType) -> bool {
        self.node_type() == kind
    }

    /// The value of a leaf, or `""`.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// Structural equality ignoring positions and sidecar data.
    ///
    /// This is the equality a semantic round-trip is measured with.
    pub fn same_structure(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_structure(b))
    }

    /// Concatenated text of all leaves and image alternatives below this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Image { alt, .. } => out.push_str(alt),
            _ => {
                if let Some(value) = &self.value {
                    out.push_str(value);
                }
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Drop the position of this node and all its descendants.
    pub fn strip_positions(&mut self) {
        self.position = None;
        for child in &mut self.children {
            child.strip_positions();
        }
    }

    /// Validate the tree shape rooted at this node.
    ///
    /// Returns every violation found, in document order; an empty list means
    /// the tree is well formed.
    pub fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if !self.is(NodeType::Root) {
            violations.push(Violation::new(Vec::new(), "tree does not start at a root"));
        }
        self.check_node(&mut Vec::new(), &mut violations);
        violations
    }

    fn check_node(&self, path: &mut Vec<usize>, violations: &mut Vec<Violation>) {
        let kind = self.node_type();

        if kind.is_leaf() != self.value.is_some() {
            let message = if kind.is_leaf() {
                format!("{kind} has no value")
            } else {
                format!("{kind} carries a value")
            };
            violations.push(Violation::new(path.clone(), message));
        }
        if !kind.is_parent() && !self.children.is_empty() {
            violations.push(Violation::new(path.clone(), format!("{kind} has children")));
        }
        if let NodeKind::Heading { depth } = self.kind
            && !(1..=6).contains(&depth)
        {
            violations.push(Violation::new(
                path.clone(),
                format!("heading depth {depth} is out of range"),
            ));
        }

        let mut previous: Option<&Position> = None;
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            let child_kind = child.node_type();
            let allowed = match kind {
                NodeType::Root | NodeType::BlockQuote | NodeType::ListItem => child_kind.is_block(),
                NodeType::List => child_kind == NodeType::ListItem,
                _ => child_kind.is_inline(),
            };
            if !allowed {
                violations.push(Violation::new(
                    path.clone(),
                    format!("{child_kind} cannot be a child of {kind}"),
                ));
            }

            if let Some(position) = &child.position {
                if let Some(parent) = &self.position
                    && !parent.contains(position)
                {
                    violations.push(Violation::new(
                        path.clone(),
                        format!("{child_kind} at {position} lies outside its parent at {parent}"),
                    ));
                }
                if let Some(previous) = previous
                    && previous.end.offset > position.start.offset
                {
                    violations.push(Violation::new(
                        path.clone(),
                        format!("{child_kind} at {position} overlaps its previous sibling"),
                    ));
                }
                previous = Some(position);
            }

            child.check_node(path, violations);
            path.pop();
        }
    }
}

/// One broken invariant found by [`Node::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Child indices from the checked node down to the offending node
    pub path: Vec<usize>,
    pub message: String,
}

impl Violation {
    fn new(path: Vec<usize>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.path, self.message)
    }
}
