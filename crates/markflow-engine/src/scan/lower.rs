//! Lowering: lossless syntax tree → document [`Node`] tree.
//!
//! Trivia (line prefixes, indentation, blank lines) and construct markers are
//! dropped; what remains becomes leaf values. Adjacent text tokens merge
//! into one [`Node::text`], and a soft break inside a paragraph stays in the
//! text as `\n`.
//!
//! Every lowered node gets a position spanning its first to its last
//! significant token, so leading indentation and trailing line endings are
//! never part of a node.

use markflow_syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
use rowan::{NodeOrToken, TextRange};

use super::line_index::LineIndex;
use crate::tree::{Node, NodeKind};

pub(super) struct Lowerer<'a> {
    index: &'a LineIndex<'a>,
}

impl<'a> Lowerer<'a> {
    pub(super) fn new(index: &'a LineIndex<'a>) -> Self {
        Self { index }
    }

    pub(super) fn root(&self, root: &SyntaxNode) -> Node {
        let end = usize::from(root.text_range().end());
        Node::root(self.blocks(root)).with_position(self.index.position(0..end))
    }

    fn blocks(&self, parent: &SyntaxNode) -> Vec<Node> {
        parent
            .children()
            .filter_map(|child| self.block(&child))
            .collect()
    }

    fn block(&self, node: &SyntaxNode) -> Option<Node> {
        let lowered = match node.kind() {
            SyntaxKind::HEADING => {
                let depth = tokens(node)
                    .find(|t| t.kind() == SyntaxKind::HEADING_MARKER)
                    .map_or(1, |t| t.text().len());
                Node::heading(depth as u8, self.inlines(node))
            }
            SyntaxKind::PARAGRAPH => Node::paragraph(self.inlines(node)),
            SyntaxKind::THEMATIC_BREAK => Node::thematic_break(),
            SyntaxKind::FENCED_CODE => code_block(node),
            SyntaxKind::BLOCK_QUOTE => Node::block_quote(self.blocks(node)),
            SyntaxKind::LIST => self.list(node),
            SyntaxKind::LIST_ITEM => Node::list_item(self.blocks(node)),
            _ => return None,
        };
        Some(lowered.with_position(self.index.position(significant_range(node))))
    }

    fn list(&self, node: &SyntaxNode) -> Node {
        let marker = node
            .children()
            .next()
            .and_then(|item| tokens(&item).find(|t| t.kind() == SyntaxKind::LIST_MARKER));
        let digits = marker
            .as_ref()
            .map(|t| t.text().trim_end_matches(['.', ')']))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
        let ordered = digits.is_some();
        let start = digits.and_then(|digits| digits.parse().ok());

        let items: Vec<SyntaxNode> = node
            .children()
            .filter(|child| child.kind() == SyntaxKind::LIST_ITEM)
            .collect();
        let spread = items.iter().any(item_is_spread)
            || items
                .iter()
                .take(items.len().saturating_sub(1))
                .any(ends_with_blank);

        Node {
            kind: NodeKind::List {
                ordered,
                start,
                spread,
            },
            ..Node::list(ordered, start, self.blocks(node))
        }
    }

    /// Inline content of a heading, paragraph, emphasis or link text.
    fn inlines(&self, parent: &SyntaxNode) -> Vec<Node> {
        let mut out = Vec::new();
        let mut text = TextRun::default();

        for element in parent.children_with_tokens() {
            match element {
                NodeOrToken::Token(token) => text.push(&token),
                NodeOrToken::Node(node) => {
                    let lowered = match node.kind() {
                        SyntaxKind::EMPHASIS => Node::emphasis(self.inlines(&node)),
                        SyntaxKind::STRONG => Node::strong(self.inlines(&node)),
                        SyntaxKind::CODE_SPAN => Node::inline_code(code_span_value(&node)),
                        SyntaxKind::LINK => self.link(&node),
                        SyntaxKind::IMAGE => self.image(&node),
                        SyntaxKind::HARD_BREAK => Node::hard_break(),
                        _ => continue,
                    };
                    text.flush(self.index, &mut out);
                    let range = if node.kind() == SyntaxKind::HARD_BREAK {
                        to_range(node.text_range())
                    } else {
                        significant_range(&node)
                    };
                    out.push(lowered.with_position(self.index.position(range)));
                }
            }
        }

        text.flush(self.index, &mut out);
        out
    }

    fn link(&self, node: &SyntaxNode) -> Node {
        let (destination, title) = destination_and_title(node);
        let children = child_of(node, SyntaxKind::LINK_TEXT)
            .map(|text| self.inlines(&text))
            .unwrap_or_default();
        Node::link(destination, title, children)
    }

    fn image(&self, node: &SyntaxNode) -> Node {
        let (destination, title) = destination_and_title(node);
        let alt: String = child_of(node, SyntaxKind::LINK_TEXT)
            .map(|text| self.inlines(&text))
            .unwrap_or_default()
            .iter()
            .map(Node::text_content)
            .collect();
        Node::image(destination, title, alt)
    }
}

/// Text tokens waiting to be merged into one Text node.
#[derive(Default)]
struct TextRun {
    value: String,
    range: Option<TextRange>,
}

impl TextRun {
    fn push(&mut self, token: &SyntaxToken) {
        let piece = match token.kind() {
            kind if kind.is_trivia() => return,
            SyntaxKind::MARKER | SyntaxKind::HEADING_MARKER | SyntaxKind::LIST_MARKER => return,
            SyntaxKind::SOFT_BREAK => "\n",
            SyntaxKind::ESCAPE => &token.text()[1..],
            _ => token.text(),
        };
        self.value.push_str(piece);
        self.range = Some(match self.range {
            Some(range) => range.cover(token.text_range()),
            None => token.text_range(),
        });
    }

    fn flush(&mut self, index: &LineIndex<'_>, out: &mut Vec<Node>) {
        if let Some(range) = self.range.take() {
            let value = std::mem::take(&mut self.value);
            out.push(Node::text(value).with_position(index.position(to_range(range))));
        }
    }
}

fn to_range(range: TextRange) -> std::ops::Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

fn tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(SyntaxElement::into_token)
}

fn child_of(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    node.children().find(|child| child.kind() == kind)
}

/// Range from the first to the last non-trivia token below `node`.
fn significant_range(node: &SyntaxNode) -> std::ops::Range<usize> {
    let mut significant = tokens(node).filter(|t| !t.kind().is_trivia());
    let Some(first) = significant.next() else {
        return to_range(node.text_range());
    };
    let last = significant.last().unwrap_or_else(|| first.clone());
    usize::from(first.text_range().start())..usize::from(last.text_range().end())
}

/// Concatenated text of the tokens below `node`, with escapes resolved and
/// markers and trivia dropped.
fn unescaped(node: &SyntaxNode) -> String {
    let mut out = String::new();
    for token in tokens(node) {
        match token.kind() {
            SyntaxKind::MARKER | SyntaxKind::SPACING | SyntaxKind::PREFIX => {}
            SyntaxKind::ESCAPE => out.push_str(&token.text()[1..]),
            _ => out.push_str(token.text()),
        }
    }
    out
}

fn destination_and_title(node: &SyntaxNode) -> (String, Option<String>) {
    let destination = child_of(node, SyntaxKind::LINK_DESTINATION)
        .map(|d| unescaped(&d))
        .unwrap_or_default();
    let title = child_of(node, SyntaxKind::LINK_TITLE).map(|t| unescaped(&t));
    (destination, title)
}

/// One space is stripped from both ends when both ends have one and the
/// content is not only spaces.
fn code_span_value(node: &SyntaxNode) -> String {
    let raw: String = tokens(node)
        .filter(|t| t.kind() != SyntaxKind::MARKER)
        .map(|t| t.text().to_string())
        .collect();
    match raw.strip_prefix(' ').and_then(|r| r.strip_suffix(' ')) {
        Some(inner) if !raw.bytes().all(|b| b == b' ') => inner.to_string(),
        _ => raw,
    }
}

fn code_block(node: &SyntaxNode) -> Node {
    let (lang, meta) = match child_of(node, SyntaxKind::CODE_INFO) {
        Some(info) => {
            let info = unescaped(&info);
            match info.split_once([' ', '\t']) {
                Some((lang, meta)) => {
                    let meta = meta.trim();
                    (
                        Some(lang.to_string()),
                        (!meta.is_empty()).then(|| meta.to_string()),
                    )
                }
                None => (Some(info), None),
            }
        }
        None => (None, None),
    };

    let mut value: String = child_of(node, SyntaxKind::CODE_CONTENT)
        .map(|content| {
            tokens(&content)
                .filter(|t| t.kind() == SyntaxKind::TEXT)
                .map(|t| t.text().to_string())
                .collect()
        })
        .unwrap_or_default();
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }

    Node::code_block(lang, meta, value)
}

/// Whether a blank line separates two blocks directly inside `item`.
fn item_is_spread(item: &SyntaxNode) -> bool {
    let mut seen_block = false;
    let mut blank_pending = false;
    for element in item.children_with_tokens() {
        match element {
            NodeOrToken::Token(token) => {
                if seen_block && token.kind() == SyntaxKind::BLANK_LINE {
                    blank_pending = true;
                }
            }
            NodeOrToken::Node(node) => {
                if seen_block && blank_pending {
                    return true;
                }
                seen_block = true;
                blank_pending = ends_with_blank(&node);
            }
        }
    }
    false
}

/// Whether `node` ends in a blank line, looking into the last item of a
/// trailing list.
fn ends_with_blank(node: &SyntaxNode) -> bool {
    for element in node.children_with_tokens().collect::<Vec<_>>().into_iter().rev() {
        match element {
            NodeOrToken::Token(token) => match token.kind() {
                SyntaxKind::BLANK_LINE => return true,
                kind if kind.is_trivia() => {}
                _ => return false,
            },
            NodeOrToken::Node(child) => {
                return matches!(child.kind(), SyntaxKind::LIST | SyntaxKind::LIST_ITEM)
                    && ends_with_blank(&child);
            }
        }
    }
    false
}

