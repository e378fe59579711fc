//! Per-invocation printing state.
//!
//! Handlers push a [`Frame`] while they print their children so nested
//! handlers can see what they are inside of: a thematic break inside a list
//! item must not look like the item's bullet, a break inside a heading has
//! to stay on one line, emphasis next to its parent's marker must switch
//! characters. The stack lives only as long as one [`Printer::print`] call.
//!
//! [`Printer::print`]: super::Printer::print

use crate::tree::{Node, NodeKind, NodeType};

use super::MarkdownPrinter;
use super::options::FormatOptions;

/// One construct being printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    BlockQuote,
    /// `marker` is the bullet, or the delimiter of an ordered list whose
    /// next item gets `number`
    List {
        ordered: bool,
        spread: bool,
        marker: char,
        number: u32,
    },
    ListItem,
    Heading,
    Paragraph,
    Emphasis(char),
    Strong(char),
    Link,
}

/// Surroundings of the inline node being printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Peers {
    /// Last character printed before the node
    pub before: Option<char>,
    /// First character expected after the node
    pub after: Option<char>,
    /// The node starts a line of output
    pub line_start: bool,
    /// The next sibling is a link
    pub before_link: bool,
    /// Nothing but whitespace follows the node in its parent
    pub last: bool,
}

/// Printing state handed to every [`Handler`](super::Handler).
pub struct State<'p> {
    printer: &'p MarkdownPrinter,
    stack: Vec<Frame>,
    /// Surroundings of the current inline node
    pub peers: Peers,
    /// Marker the next list must not use: that of a preceding sibling list,
    /// or the bullet of the list it is nested in
    pub(crate) avoid_marker: Option<char>,
    /// Marker chosen by the list printed last
    pub(crate) list_marker: Option<char>,
}

impl<'p> State<'p> {
    pub(crate) fn new(printer: &'p MarkdownPrinter) -> Self {
        Self {
            printer,
            stack: Vec::new(),
            peers: Peers::default(),
            avoid_marker: None,
            list_marker: None,
        }
    }

    pub fn options(&self) -> &FormatOptions {
        self.printer.options()
    }

    /// Open frames, outermost first.
    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    pub fn enter(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    pub fn exit(&mut self) {
        self.stack.pop();
    }

    pub fn inside(&self, frame: impl Fn(&Frame) -> bool) -> bool {
        self.stack.iter().any(frame)
    }

    /// Whether the current node must print on a single line: inline
    /// constructs and headings cannot span line endings.
    pub fn on_one_line(&self) -> bool {
        self.inside(|frame| {
            matches!(
                frame,
                Frame::Heading | Frame::Emphasis(_) | Frame::Strong(_) | Frame::Link
            )
        })
    }

    fn innermost_list(&self) -> Option<Frame> {
        self.stack
            .iter()
            .rev()
            .find(|frame| matches!(frame, Frame::List { .. }))
            .copied()
    }

    /// Whether the innermost list is tight.
    fn in_tight_list(&self) -> bool {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::List { spread, .. } => Some(!spread),
            _ => None,
        }) == Some(true)
    }

    /// Marker of the next item of the innermost list, e.g. `-` or `3.`.
    pub fn next_item_marker(&mut self) -> String {
        let increment = self.options().increment_list_marker;
        let bullet = self.options().bullet.as_char();
        let list = self
            .stack
            .iter_mut()
            .rev()
            .find(|frame| matches!(frame, Frame::List { .. }));
        match list {
            Some(Frame::List {
                ordered: true,
                marker,
                number,
                ..
            }) => {
                let text = format!("{number}{marker}");
                if increment {
                    *number = number.saturating_add(1);
                }
                text
            }
            Some(Frame::List { marker, .. }) => marker.to_string(),
            _ => bullet.to_string(),
        }
    }

    /// Print one node with the handler registered for its kind.
    pub fn handle(&mut self, node: &Node) -> String {
        let printer = self.printer;
        match printer.handler(node.node_type()) {
            Some(handler) => handler(node, self),
            None => String::new(),
        }
    }

    /// Print block children, separated by blank lines (or single line
    /// endings inside a tight list).
    pub fn blocks(&mut self, parent: &Node) -> String {
        let tight = matches!(parent.node_type(), NodeType::List | NodeType::ListItem)
            && self.in_tight_list();

        // An empty item holding a list with the same bullet reads as a rule
        let enclosing_bullet = match (parent.node_type(), self.innermost_list()) {
            (
                NodeType::ListItem,
                Some(Frame::List {
                    ordered: false,
                    marker,
                    ..
                }),
            ) => Some(marker),
            _ => None,
        };

        let mut out = String::new();
        let mut previous: Option<&Node> = None;
        let mut previous_marker = None;
        for child in &parent.children {
            if let Some(previous) = previous {
                let adjacent_paragraphs =
                    previous.is(NodeType::Paragraph) && child.is(NodeType::Paragraph);
                out.push_str(if tight && !adjacent_paragraphs {
                    "\n"
                } else {
                    "\n\n"
                });
            }

            // Adjacent lists of one kind would merge into a single list
            self.avoid_marker = match (previous.map(|p| &p.kind), &child.kind) {
                (
                    Some(NodeKind::List { ordered: a, .. }),
                    NodeKind::List { ordered: b, .. },
                ) if a == b => previous_marker,
                (None, NodeKind::List { .. }) => enclosing_bullet,
                _ => None,
            };
            self.list_marker = None;

            out.push_str(&self.handle(child));
            previous_marker = self.list_marker.take();
            previous = Some(child);
        }
        self.avoid_marker = None;
        out
    }

    /// Print inline children, tracking what surrounds each of them.
    pub fn inlines(&mut self, parent: &Node) -> String {
        let edge = match self.stack.last() {
            Some(Frame::Emphasis(c) | Frame::Strong(c)) => Some(*c),
            _ => None,
        };
        let starts_line = matches!(parent.node_type(), NodeType::Paragraph);

        let mut out = String::new();
        for (index, child) in parent.children.iter().enumerate() {
            let next = parent.children.get(index + 1);
            let last = parent.children[index + 1..].iter().all(is_blank);
            // Edge whitespace ends up outside the enclosing delimiters
            let before = if out.trim().is_empty() {
                edge.or(out.chars().next_back())
            } else {
                out.chars().next_back()
            };
            let after = match next.and_then(|next| leading_char(next, self.options())) {
                Some(c) if last => edge.or(Some(c)),
                Some(c) => Some(c),
                None => edge,
            };
            let tail = out.trim_end_matches([' ', '\t']);
            self.peers = Peers {
                before,
                after,
                line_start: tail.ends_with('\n') || (starts_line && tail.is_empty()),
                before_link: next.is_some_and(|next| next.is(NodeType::Link)),
                last,
            };
            let printed = self.handle(child);
            out.push_str(&printed);
        }
        self.peers = Peers::default();
        out
    }
}

/// Whether `node` prints as nothing but whitespace.
fn is_blank(node: &Node) -> bool {
    match node.node_type() {
        NodeType::Text => node.value().trim().is_empty(),
        NodeType::Emphasis | NodeType::Strong => node.children.iter().all(is_blank),
        _ => false,
    }
}

/// First character `node` prints, as far as neighbouring emphasis cares.
fn leading_char(node: &Node, options: &FormatOptions) -> Option<char> {
    match &node.kind {
        NodeKind::Text => node.value().chars().next().map(|c| {
            if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']') {
                '\\'
            } else {
                c
            }
        }),
        NodeKind::Emphasis => Some(options.emphasis.as_char()),
        NodeKind::Strong => Some(options.strong.as_char()),
        NodeKind::InlineCode => Some('`'),
        NodeKind::Link { .. } => Some('['),
        NodeKind::Image { .. } => Some('!'),
        NodeKind::Break => Some('\\'),
        _ => None,
    }
}
