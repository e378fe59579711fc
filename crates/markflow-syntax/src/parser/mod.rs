//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming a token stream
//! into a syntax tree using the **event-based** architecture from rust-analyzer.
//!
//! Grammar functions never build tree nodes directly. They emit a flat list
//! of [`Event`]s and the [`Sink`] turns that list into a Rowan green tree.
//!
//! ## The Marker System
//!
//! When you call `parser.start()`, you get a [`Marker`]. This marker **must**
//! be either:
//!
//! - Completed with `marker.complete(parser, KIND)` → emits Start+Finish
//! - Abandoned with `marker.abandon(parser)` → removes the placeholder
//!
//! Dropping a marker without doing either panics.
//!
//! ```ignore
//! let m = parser.start();
//! parser.bump();
//! m.complete(parser, SyntaxKind::PARAGRAPH);
//! ```
//!
//! ## Containers
//!
//! Markdown block structure is line oriented: every line first has to match
//! the prefixes of the open container blocks (`> ` for a block quote, the
//! content indentation for a list item) before the rest of the line is
//! looked at. The parser keeps that stack of open containers and, at the
//! start of each line, records how many of them matched (`matched()`). A
//! container whose prefix did not match is closed by its grammar rule.
//!
//! ## Public API
//!
//! ```
//! use markflow_syntax::parse;
//!
//! let tree = parse("# Hello\n");
//! assert_eq!(tree.text().to_string(), "# Hello\n");
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::ops::Range;

use rowan::GreenNode;

use crate::lexer::{Token, lex};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// Tab stops used when measuring indentation.
const TAB_WIDTH: usize = 4;

/// An open container block whose prefix every following line must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    /// Block quote: optional indentation, `>`, one optional space.
    Quote,
    /// List item: indentation up to the item's content column. Blank lines
    /// always match.
    Item { content_column: usize },
}

/// A recoverable problem found while parsing.
///
/// The tree is still complete and lossless; the offending construct was
/// kept as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Stable identifier of the check (`unclosed-emphasis`, ...)
    pub rule: &'static str,
    /// Human readable description
    pub message: String,
    /// Byte range in the source
    pub range: Range<usize>,
}

/// Result of parsing: the green tree plus any syntax errors.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    /// The root of the syntax tree.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Recoverable problems in source order.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }
}

/// The parser state machine.
///
/// Holds the token stream, current position, accumulated events and the
/// stack of open containers. Grammar functions receive `&mut Parser` and use
/// its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `kind_at()`, `column()`
/// - Consume tokens: `bump()`, `bump_as()`, `bump_n()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    events: Vec<Event>,
    /// Visual column where each token starts (one extra entry for EOF)
    columns: Vec<usize>,
    /// Byte offset where each token starts (one extra entry for EOF)
    offsets: Vec<usize>,
    containers: Vec<Container>,
    matched: usize,
    errors: Vec<SyntaxError>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        let mut columns = Vec::with_capacity(tokens.len() + 1);
        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut column = 0;
        let mut offset = 0;
        for token in tokens {
            columns.push(column);
            offsets.push(offset);
            offset += token.text.len();
            column = match token.kind {
                SyntaxKind::NEWLINE => 0,
                _ if token.text == "\t" => (column / TAB_WIDTH + 1) * TAB_WIDTH,
                _ => column + token.text.chars().count(),
            };
        }
        columns.push(column);
        offsets.push(offset);

        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            columns,
            offsets,
            containers: Vec::new(),
            matched: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the tokens and return the tree with its syntax errors.
    pub fn parse(mut self) -> Parse {
        grammar::root(&mut self);
        log::trace!(
            "parsed {} tokens into {} events, {} syntax errors",
            self.tokens.len(),
            self.events.len(),
            self.errors.len()
        );
        let green = Sink::new(self.tokens, self.events).finish();
        Parse {
            green,
            errors: self.errors,
        }
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.kind_at(self.pos + n)
    }

    /// Kind of the token at an absolute index, or EOF if past end.
    pub fn kind_at(&self, index: usize) -> SyntaxKind {
        self.tokens
            .get(index)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Text of the token at an absolute index, or `""` if past end.
    pub fn text_at(&self, index: usize) -> &'input str {
        self.tokens.get(index).map(|t| t.text).unwrap_or("")
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.text_at(self.pos)
    }

    /// Absolute index of the current token.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Visual column (tabs expanded) where the token at `index` starts.
    pub fn column(&self, index: usize) -> usize {
        let last = self.columns.len() - 1;
        self.columns[index.min(last)]
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            let kind = self.current();
            self.bump_as(kind);
        }
    }

    /// Consume the current token, re-tagging it with `kind`.
    pub fn bump_as(&mut self, kind: SyntaxKind) {
        self.bump_n(1, kind);
    }

    /// Consume n tokens as a single composite token.
    pub fn bump_n(&mut self, n: usize, kind: SyntaxKind) {
        if n > 0 && self.pos + n <= self.tokens.len() {
            self.events.push(Event::Token {
                kind,
                n_raw_tokens: n as u32,
            });
            self.pos += n;
        }
    }

    /// Consume every token up to (not including) the absolute index `end`
    /// as one composite token.
    pub fn bump_to(&mut self, end: usize, kind: SyntaxKind) {
        if end > self.pos {
            self.bump_n(end - self.pos, kind);
        }
    }

    /// Index of the line ending (or EOF) at or after `from`.
    pub fn line_end(&self, from: usize) -> usize {
        (from..self.tokens.len())
            .find(|&i| self.tokens[i].kind == SyntaxKind::NEWLINE)
            .unwrap_or(self.tokens.len())
    }

    /// Index of the first non-whitespace token at or after `from`.
    pub fn skip_whitespace(&self, from: usize) -> usize {
        let mut i = from;
        while self.kind_at(i) == SyntaxKind::WHITESPACE {
            i += 1;
        }
        i
    }

    /// True if only whitespace remains on the line starting at `from`.
    pub fn is_blank_from(&self, from: usize) -> bool {
        matches!(
            self.kind_at(self.skip_whitespace(from)),
            SyntaxKind::NEWLINE | SyntaxKind::EOF
        )
    }

    /// Record a recoverable error spanning the tokens `[start, end)`.
    pub fn error(&mut self, rule: &'static str, message: impl Into<String>, start: usize, end: usize) {
        let last = self.offsets.len() - 1;
        let range = self.offsets[start.min(last)]..self.offsets[end.min(last)];
        self.errors.push(SyntaxError {
            rule,
            message: message.into(),
            range,
        });
    }

    // === Containers ===

    /// Number of open containers.
    pub(crate) fn depth(&self) -> usize {
        self.containers.len()
    }

    /// How many open containers matched the current line.
    pub(crate) fn matched(&self) -> usize {
        self.matched
    }

    /// Open a container whose opening line has already been consumed.
    pub(crate) fn push_container(&mut self, container: Container) {
        self.containers.push(container);
        self.matched = self.containers.len();
    }

    pub(crate) fn pop_container(&mut self) {
        self.containers.pop();
        self.matched = self.matched.min(self.containers.len());
    }

    /// Match the container prefixes of the line starting at the current
    /// position and consume them as a single PREFIX token.
    pub(crate) fn start_line(&mut self) {
        let (matched, end) = self.scan_prefixes(self.pos);
        self.bump_to(end, SyntaxKind::PREFIX);
        self.matched = matched;
    }

    /// Consume the line ending at the current position (if any) and the
    /// container prefixes of the next line.
    pub(crate) fn next_line(&mut self) {
        if self.at(SyntaxKind::NEWLINE) {
            self.bump();
            self.start_line();
        }
    }

    /// Match container prefixes for a line starting at `line_start` without
    /// consuming anything. Returns the number of containers that matched and
    /// the index just past the matched prefixes.
    pub(crate) fn scan_prefixes(&self, line_start: usize) -> (usize, usize) {
        let mut i = line_start;
        let mut matched = 0;
        for container in &self.containers {
            match *container {
                Container::Quote => match self.quote_prefix(i) {
                    Some(end) => i = end,
                    None => break,
                },
                Container::Item { content_column } => {
                    let blank = self.is_blank_from(i);
                    let mut j = i;
                    while self.kind_at(j) == SyntaxKind::WHITESPACE
                        && self.column(j) < content_column
                    {
                        j += 1;
                    }
                    if !blank && self.column(j) < content_column {
                        break;
                    }
                    i = j;
                }
            }
            matched += 1;
        }
        (matched, i)
    }

    /// Match `   > ` at `from`, returning the index past the prefix.
    pub(crate) fn quote_prefix(&self, from: usize) -> Option<usize> {
        let gt = self.skip_whitespace(from);
        if self.kind_at(gt) != SyntaxKind::GT || self.column(gt) - self.column(from) > 3 {
            return None;
        }
        let mut end = gt + 1;
        if self.kind_at(end) == SyntaxKind::WHITESPACE {
            end += 1;
        }
        Some(end)
    }
}

/// A marker for a node being constructed.
///
/// When you call `parser.start()`, a `Placeholder` event is pushed and you
/// get a `Marker` pointing to it. Every marker must be completed or
/// abandoned; dropping one otherwise panics, which catches grammar bugs at
/// runtime rather than producing corrupt trees.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Abandon this marker without creating a node.
    ///
    /// If other events were pushed after `start()`, the placeholder stays
    /// behind and the Sink ignores it.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// A marker for a node that has been completed.
///
/// `precede()` wraps the completed node in a new parent. Lists use this:
/// the LIST node is opened only after the first LIST_ITEM proved there is
/// one.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed node
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent node that will contain this node.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse markdown source into a syntax tree.
pub fn parse(source: &str) -> SyntaxNode {
    parse_with_errors(source).syntax()
}

/// Parse markdown source, keeping the recoverable syntax errors.
pub fn parse_with_errors(source: &str) -> Parse {
    let tokens = lex(source);
    Parser::new(&tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_input() {
        let tree = parse("");
        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 0);
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "Hello, world!";
        assert_eq!(parse(input).text(), input);
    }

    #[test]
    fn parse_simple_paragraph() {
        let tree = parse("Hello");
        let para = tree.children().next().map(|n| n.kind());
        assert_eq!(para, Some(SyntaxKind::PARAGRAPH));
    }

    #[test]
    fn columns_expand_tabs() {
        let tokens = lex("\ta\n  b");
        let parser = Parser::new(&tokens);
        // "\t" "a" "\n" " " " " "b"
        assert_eq!(parser.column(1), 4);
        assert_eq!(parser.column(3), 0);
        assert_eq!(parser.column(5), 2);
    }

    #[test]
    fn item_prefix_matches_blank_lines() {
        let tokens = lex("\n  x\n x");
        let mut parser = Parser::new(&tokens);
        parser.containers.push(Container::Item { content_column: 2 });
        assert_eq!(parser.scan_prefixes(0), (1, 0));
        assert_eq!(parser.scan_prefixes(1), (1, 3));
        assert_eq!(parser.scan_prefixes(5).0, 0);
    }

    #[test]
    fn quote_prefix_allows_three_spaces() {
        let tokens = lex("   > a");
        let parser = Parser::new(&tokens);
        assert_eq!(parser.quote_prefix(0), Some(5));

        let tokens = lex("    > a");
        let parser = Parser::new(&tokens);
        assert_eq!(parser.quote_prefix(0), None);
    }

    #[test]
    fn errors_carry_byte_ranges() {
        let parse = parse_with_errors("a *b");
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].rule, "unclosed-emphasis");
        assert_eq!(parse.errors()[0].range, 2..3);
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let tokens = lex("test");
            let mut parser = Parser::new(&tokens);
            let _marker = parser.start();
        });
        assert!(result.is_err());
    }

    #[test]
    fn marker_can_be_abandoned() {
        let tokens = lex("test");
        let mut parser = Parser::new(&tokens);
        let marker = parser.start();
        marker.abandon(&mut parser);
        assert!(parser.events.is_empty());
    }
}
