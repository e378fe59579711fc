//! # Inline-Level Grammar
//!
//! Inline elements are the formatting within a line of a block: code spans,
//! links, images, emphasis and backslash escapes. Inline parsing always works
//! on a bounded token range (one line of a paragraph or a heading, or the
//! text of a link), so nothing inline spans a line break.
//!
//! ## Two passes
//!
//! Emphasis can only be decided once the whole range is known (`*a **b** c*`
//! needs the last `*` to know what the first one means), so parsing a range
//! happens in two passes:
//!
//! 1. [`plan`] walks the range without consuming anything. It finds code
//!    spans and links (which bind tighter than emphasis), collects runs of
//!    `*` and `_`, and pairs those runs into emphasis and strong emphasis
//!    with the delimiter-run algorithm.
//! 2. [`inline`] replays the range, emitting nodes at the token indices the
//!    plan recorded. Everything else is bumped as plain tokens.
//!
//! ## Error Tolerance
//!
//! - A backtick run with no matching run stays text (`unclosed-code-span`)
//! - `[text](` without a valid destination and `)` stays text (`unclosed-link`)
//! - An opening `*`/`_` run that never closes stays text (`unclosed-emphasis`)

use std::collections::HashMap;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse inline content from the current position up to the absolute token
/// index `end`.
pub(super) fn inline(p: &mut Parser<'_, '_>, end: usize) {
    let plan = plan(p, end);
    let mut open: Vec<(crate::parser::Marker, SyntaxKind)> = Vec::new();

    while p.pos() < end {
        let i = p.pos();
        if let Some(&width) = plan.closers.get(&i) {
            p.bump_n(width, SyntaxKind::MARKER);
            if let Some((m, kind)) = open.pop() {
                m.complete(p, kind);
            }
        } else if let Some(&(width, kind)) = plan.openers.get(&i) {
            let m = p.start();
            p.bump_n(width, SyntaxKind::MARKER);
            open.push((m, kind));
        } else if let Some(&(ticks, close)) = plan.code_spans.get(&i) {
            code_span(p, ticks, close);
        } else if let Some(shape) = plan.links.get(&i) {
            link(p, shape);
        } else {
            p.bump();
        }
    }

    while let Some((m, kind)) = open.pop() {
        m.complete(p, kind);
    }
}

fn code_span(p: &mut Parser<'_, '_>, ticks: usize, close: usize) {
    let m = p.start();
    p.bump_n(ticks, SyntaxKind::MARKER);
    p.bump_to(close, SyntaxKind::TEXT);
    p.bump_n(ticks, SyntaxKind::MARKER);
    m.complete(p, SyntaxKind::CODE_SPAN);
}

fn link(p: &mut Parser<'_, '_>, shape: &LinkShape) {
    let m = p.start();
    if shape.image {
        p.bump_as(SyntaxKind::MARKER);
    }
    p.bump_as(SyntaxKind::MARKER);

    let text = p.start();
    inline(p, shape.text_end);
    text.complete(p, SyntaxKind::LINK_TEXT);

    p.bump_as(SyntaxKind::MARKER);
    p.bump_as(SyntaxKind::MARKER);
    p.bump_to(shape.destination.0, SyntaxKind::SPACING);

    let destination = p.start();
    let end = shape.destination.1;
    if shape.angle {
        p.bump_as(SyntaxKind::MARKER);
        while p.pos() < end - 1 {
            p.bump();
        }
        p.bump_as(SyntaxKind::MARKER);
    } else {
        while p.pos() < end {
            p.bump();
        }
    }
    destination.complete(p, SyntaxKind::LINK_DESTINATION);

    if let Some((open, close)) = shape.title {
        p.bump_to(open, SyntaxKind::SPACING);
        let title = p.start();
        p.bump_as(SyntaxKind::MARKER);
        while p.pos() < close - 1 {
            p.bump();
        }
        p.bump_as(SyntaxKind::MARKER);
        title.complete(p, SyntaxKind::LINK_TITLE);
    }

    p.bump_to(shape.end - 1, SyntaxKind::SPACING);
    p.bump_as(SyntaxKind::MARKER);
    m.complete(
        p,
        if shape.image {
            SyntaxKind::IMAGE
        } else {
            SyntaxKind::LINK
        },
    );
}

// === Planning ===

/// Where the nodes of one inline range start, keyed by absolute token index.
#[derive(Debug, Default)]
struct Plan {
    /// Opening backtick index → (run length, index of the closing run)
    code_spans: HashMap<usize, (usize, usize)>,
    /// `[` (or `!` of an image) index → link layout
    links: HashMap<usize, LinkShape>,
    /// First delimiter token of an opener → (tokens used, node kind)
    openers: HashMap<usize, (usize, SyntaxKind)>,
    /// First delimiter token of a closer → tokens used
    closers: HashMap<usize, usize>,
}

/// Token layout of a complete link or image.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkShape {
    image: bool,
    /// Index of the closing `]`
    text_end: usize,
    /// Destination tokens `[start, end)`, including `<`/`>` when `angle`
    destination: (usize, usize),
    angle: bool,
    /// Title tokens `[open quote, past close quote)`
    title: Option<(usize, usize)>,
    /// Index just past the closing `)`
    end: usize,
}

enum LinkScan {
    Link(LinkShape),
    /// `[text](` that never becomes a valid link
    Unclosed { start: usize, end: usize },
    NotLink,
}

/// A run of `*` or `_` taking part in emphasis matching.
#[derive(Debug, Clone)]
struct Delimiter {
    kind: SyntaxKind,
    /// Index of the first token of the run
    start: usize,
    /// Original run length
    length: usize,
    /// Remaining unused tokens `[low, high)`
    low: usize,
    high: usize,
    can_open: bool,
    can_close: bool,
    used: bool,
}

impl Delimiter {
    fn remaining(&self) -> usize {
        self.high - self.low
    }
}

fn plan(p: &mut Parser<'_, '_>, end: usize) -> Plan {
    let start = p.pos();
    let mut plan = Plan::default();
    let mut delimiters = Vec::new();

    let mut i = start;
    while i < end {
        match p.kind_at(i) {
            SyntaxKind::BACKTICK => {
                let ticks = run_length(p, i, end, SyntaxKind::BACKTICK);
                match code_span_close(p, i, ticks, end) {
                    Some(close) => {
                        plan.code_spans.insert(i, (ticks, close));
                        i = close + ticks;
                    }
                    None => {
                        p.error(
                            "unclosed-code-span",
                            "Code span is never closed",
                            i,
                            i + ticks,
                        );
                        i += ticks;
                    }
                }
            }
            SyntaxKind::BANG | SyntaxKind::LBRACKET => {
                let image = p.kind_at(i) == SyntaxKind::BANG;
                if image && (i + 1 >= end || p.kind_at(i + 1) != SyntaxKind::LBRACKET) {
                    i += 1;
                    continue;
                }
                match scan_link(p, i, end) {
                    LinkScan::Link(shape) => {
                        let next = shape.end;
                        plan.links.insert(i, shape);
                        i = next;
                    }
                    LinkScan::Unclosed { start, end } => {
                        p.error("unclosed-link", "Link destination is never closed", start, end);
                        i += if image { 2 } else { 1 };
                    }
                    LinkScan::NotLink => i += if image { 2 } else { 1 },
                }
            }
            kind @ (SyntaxKind::STAR | SyntaxKind::UNDERSCORE) => {
                let length = run_length(p, i, end, kind);
                delimiters.push(delimiter(p, kind, i, length, start, end));
                i += length;
            }
            _ => i += 1,
        }
    }

    match_emphasis(&mut delimiters, &mut plan);

    for d in delimiters.iter().filter(|d| !d.used && d.can_open && !d.can_close) {
        p.error(
            "unclosed-emphasis",
            "Emphasis is never closed",
            d.start,
            d.start + d.length,
        );
    }

    plan
}

fn run_length(p: &Parser<'_, '_>, from: usize, end: usize, kind: SyntaxKind) -> usize {
    let mut i = from;
    while i < end && p.kind_at(i) == kind {
        i += 1;
    }
    i - from
}

/// Index of the backtick run closing a code span opened by `ticks` backticks.
fn code_span_close(p: &Parser<'_, '_>, open: usize, ticks: usize, end: usize) -> Option<usize> {
    let mut i = open + ticks;
    while i < end {
        if p.kind_at(i) == SyntaxKind::BACKTICK {
            let run = run_length(p, i, end, SyntaxKind::BACKTICK);
            if run == ticks {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

fn skip_whitespace(p: &Parser<'_, '_>, from: usize, end: usize) -> usize {
    p.skip_whitespace(from).min(end)
}

/// Lookahead for `[text](destination "title")`, optionally preceded by `!`.
fn scan_link(p: &Parser<'_, '_>, start: usize, end: usize) -> LinkScan {
    let image = p.kind_at(start) == SyntaxKind::BANG;
    let open = if image { start + 1 } else { start };

    // Matching `]`, skipping over code spans
    let mut depth = 0;
    let mut i = open + 1;
    let text_end = loop {
        if i >= end {
            return LinkScan::NotLink;
        }
        match p.kind_at(i) {
            SyntaxKind::LBRACKET => depth += 1,
            SyntaxKind::RBRACKET if depth == 0 => break i,
            SyntaxKind::RBRACKET => depth -= 1,
            SyntaxKind::BACKTICK => {
                let ticks = run_length(p, i, end, SyntaxKind::BACKTICK);
                i = match code_span_close(p, i, ticks, end) {
                    Some(close) => close + ticks,
                    None => i + ticks,
                };
                continue;
            }
            _ => {}
        }
        i += 1;
    };

    if text_end + 1 >= end || p.kind_at(text_end + 1) != SyntaxKind::LPAREN {
        return LinkScan::NotLink;
    }
    let unclosed = LinkScan::Unclosed {
        start,
        end: text_end + 2,
    };

    // Destination
    let dest_start = skip_whitespace(p, text_end + 2, end);
    let (dest_end, angle) = if p.kind_at(dest_start) == SyntaxKind::LT && dest_start < end {
        let mut j = dest_start + 1;
        while j < end && !matches!(p.kind_at(j), SyntaxKind::GT | SyntaxKind::LT) {
            j += 1;
        }
        if j >= end || p.kind_at(j) != SyntaxKind::GT {
            return unclosed;
        }
        (j + 1, true)
    } else {
        let mut j = dest_start;
        let mut parens = 0usize;
        while j < end {
            match p.kind_at(j) {
                SyntaxKind::WHITESPACE => break,
                SyntaxKind::LPAREN => parens += 1,
                SyntaxKind::RPAREN if parens == 0 => break,
                SyntaxKind::RPAREN => parens -= 1,
                _ => {}
            }
            j += 1;
        }
        (j, false)
    };

    // Title, separated from a destination by whitespace
    let mut i = skip_whitespace(p, dest_end, end);
    let mut title = None;
    if i > dest_end && i < end && p.kind_at(i) == SyntaxKind::QUOTE {
        let mut j = i + 1;
        while j < end && p.kind_at(j) != SyntaxKind::QUOTE {
            j += 1;
        }
        if j >= end {
            return unclosed;
        }
        title = Some((i, j + 1));
        i = skip_whitespace(p, j + 1, end);
    }

    if i >= end || p.kind_at(i) != SyntaxKind::RPAREN {
        return unclosed;
    }

    LinkScan::Link(LinkShape {
        image,
        text_end,
        destination: (dest_start, dest_end),
        angle,
        title,
        end: i + 1,
    })
}

/// First character of the token at `index`, if it lies inside `[start, end)`.
fn char_at(p: &Parser<'_, '_>, index: usize, start: usize, end: usize) -> Option<char> {
    (start..end)
        .contains(&index)
        .then(|| p.text_at(index).chars().next())
        .flatten()
}

/// Last character of the token before `index`, if it lies inside the range.
fn char_before(p: &Parser<'_, '_>, index: usize, start: usize) -> Option<char> {
    (index > start)
        .then(|| p.text_at(index - 1).chars().next_back())
        .flatten()
}

/// Classify a delimiter run by the characters around it. The edges of the
/// range count as whitespace.
fn delimiter(
    p: &Parser<'_, '_>,
    kind: SyntaxKind,
    at: usize,
    length: usize,
    start: usize,
    end: usize,
) -> Delimiter {
    let before = char_before(p, at, start);
    let after = char_at(p, at + length, start, end);

    let left_flanking = after.is_some_and(|c| !c.is_whitespace());
    let right_flanking = before.is_some_and(|c| !c.is_whitespace());

    let (can_open, can_close) = if kind == SyntaxKind::UNDERSCORE {
        // No intraword emphasis with `_`
        (
            left_flanking && !before.is_some_and(char::is_alphanumeric),
            right_flanking && !after.is_some_and(char::is_alphanumeric),
        )
    } else {
        (left_flanking, right_flanking)
    };

    Delimiter {
        kind,
        start: at,
        length,
        low: at,
        high: at + length,
        can_open,
        can_close,
        used: false,
    }
}

/// Pair delimiter runs into emphasis (one token each side) and strong
/// emphasis (two tokens each side). Closers are processed left to right;
/// each takes the nearest compatible opener.
fn match_emphasis(delimiters: &mut [Delimiter], plan: &mut Plan) {
    for closer in 0..delimiters.len() {
        if !delimiters[closer].can_close {
            continue;
        }
        while delimiters[closer].remaining() > 0 {
            let Some(opener) = (0..closer).rev().find(|&o| {
                let d = &delimiters[o];
                d.kind == delimiters[closer].kind
                    && d.can_open
                    && d.remaining() > 0
                    && !multiple_of_three(d, &delimiters[closer])
            }) else {
                break;
            };

            let width = if delimiters[opener].remaining() >= 2 && delimiters[closer].remaining() >= 2 {
                2
            } else {
                1
            };
            let kind = if width == 2 {
                SyntaxKind::STRONG
            } else {
                SyntaxKind::EMPHASIS
            };

            delimiters[opener].high -= width;
            delimiters[opener].used = true;
            plan.openers.insert(delimiters[opener].high, (width, kind));

            plan.closers.insert(delimiters[closer].low, width);
            delimiters[closer].low += width;
            delimiters[closer].used = true;

            // Runs between the pair can no longer match anything
            for d in &mut delimiters[opener + 1..closer] {
                d.high = d.low;
            }
        }
    }
}

/// A run that can both open and close may not pair with another run when
/// their combined length is a multiple of three, unless both are.
fn multiple_of_three(opener: &Delimiter, closer: &Delimiter) -> bool {
    (opener.can_close || closer.can_open)
        && (opener.length + closer.length) % 3 == 0
        && !(opener.length % 3 == 0 && closer.length % 3 == 0)
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::parser::parse_with_errors;
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use pretty_assertions::assert_eq;

    /// Inline node kinds of the first paragraph, with their text.
    fn inline_nodes(input: &str) -> Vec<(SyntaxKind, String)> {
        let tree = parse(input);
        let para = tree.first_child().expect("paragraph");
        para.descendants()
            .skip(1)
            .map(|n: SyntaxNode| (n.kind(), n.text().to_string()))
            .collect()
    }

    fn node(kind: SyntaxKind, text: &str) -> (SyntaxKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn emphasis_and_strong() {
        assert_eq!(
            inline_nodes("*a* **b** _c_ __d__"),
            vec![
                node(SyntaxKind::EMPHASIS, "*a*"),
                node(SyntaxKind::STRONG, "**b**"),
                node(SyntaxKind::EMPHASIS, "_c_"),
                node(SyntaxKind::STRONG, "__d__"),
            ]
        );
    }

    #[test]
    fn triple_delimiters_nest() {
        assert_eq!(
            inline_nodes("***a***"),
            vec![
                node(SyntaxKind::EMPHASIS, "***a***"),
                node(SyntaxKind::STRONG, "**a**"),
            ]
        );
    }

    #[test]
    fn strong_inside_emphasis() {
        assert_eq!(
            inline_nodes("*a**b**c*"),
            vec![
                node(SyntaxKind::EMPHASIS, "*a**b**c*"),
                node(SyntaxKind::STRONG, "**b**"),
            ]
        );
    }

    #[test]
    fn no_intraword_underscore() {
        assert_eq!(inline_nodes("snake_case_name"), vec![]);
        assert_eq!(
            inline_nodes("a*b*c"),
            vec![node(SyntaxKind::EMPHASIS, "*b*")]
        );
    }

    #[test]
    fn spaced_delimiters_are_text() {
        assert_eq!(inline_nodes("a * b * c"), vec![]);
        assert!(parse_with_errors("a * b * c").errors().is_empty());
    }

    #[test]
    fn code_span_hides_delimiters() {
        assert_eq!(
            inline_nodes("*a `*` b*"),
            vec![
                node(SyntaxKind::EMPHASIS, "*a `*` b*"),
                node(SyntaxKind::CODE_SPAN, "`*`"),
            ]
        );
    }

    #[test]
    fn code_span_needs_matching_run() {
        assert_eq!(
            inline_nodes("``a`b``"),
            vec![node(SyntaxKind::CODE_SPAN, "``a`b``")]
        );
        let parse = parse_with_errors("`a");
        assert_eq!(parse.errors()[0].rule, "unclosed-code-span");
    }

    #[test]
    fn link_with_title() {
        assert_eq!(
            inline_nodes(r#"[a *b*](http://x.y/(z) "T")"#),
            vec![
                node(SyntaxKind::LINK, r#"[a *b*](http://x.y/(z) "T")"#),
                node(SyntaxKind::LINK_TEXT, "a *b*"),
                node(SyntaxKind::EMPHASIS, "*b*"),
                node(SyntaxKind::LINK_DESTINATION, "http://x.y/(z)"),
                node(SyntaxKind::LINK_TITLE, "\"T\""),
            ]
        );
    }

    #[test]
    fn image_with_angle_destination() {
        assert_eq!(
            inline_nodes("![alt](<a b>)"),
            vec![
                node(SyntaxKind::IMAGE, "![alt](<a b>)"),
                node(SyntaxKind::LINK_TEXT, "alt"),
                node(SyntaxKind::LINK_DESTINATION, "<a b>"),
            ]
        );
    }

    #[test]
    fn bracket_without_destination_is_text() {
        assert_eq!(inline_nodes("[1] and [a]"), vec![]);
        assert!(parse_with_errors("[1] and [a]").errors().is_empty());
    }

    #[test]
    fn broken_destination_warns() {
        let parse = parse_with_errors("see [a](b c");
        let rules: Vec<_> = parse.errors().iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec!["unclosed-link"]);
    }

    #[test]
    fn delimiters_do_not_cross_links() {
        assert_eq!(
            inline_nodes("*[a*](b)"),
            vec![
                node(SyntaxKind::LINK, "[a*](b)"),
                node(SyntaxKind::LINK_TEXT, "a*"),
            ]
        );
    }

    #[test]
    fn unclosed_emphasis_warns() {
        let parse = parse_with_errors("some *half done");
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].rule, "unclosed-emphasis");
        assert_eq!(parse.errors()[0].range, 5..6);
    }

    #[test]
    fn escapes_are_not_delimiters() {
        assert_eq!(inline_nodes(r"\*a\*"), vec![]);
    }
}
