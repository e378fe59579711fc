//! Block-level grammar rules.
//!
//! Every block rule is entered positioned after the container prefixes of
//! its first line and returns positioned after the container prefixes of the
//! first line it did not consume (see [`Parser::start_line`]).

use crate::parser::{CompletedMarker, Container, Parser};
use crate::syntax_kind::SyntaxKind;

use super::{inline, spacing, trim_end};

/// Maximum indentation (in columns) before a block marker stops counting.
const MAX_INDENT: usize = 3;

/// Parse blocks while every container up to `depth` matches the line.
pub(super) fn blocks(p: &mut Parser<'_, '_>, depth: usize) {
    while !p.at_end() && p.matched() >= depth {
        block(p, depth);
    }
}

/// Parse a block element.
fn block(p: &mut Parser<'_, '_>, depth: usize) {
    let from = p.pos();

    if p.is_blank_from(from) {
        blank_line(p);
    } else if at_thematic_break(p, from) {
        thematic_break(p);
    } else if let Some(level) = heading_level(p, from) {
        heading(p, level);
    } else if let Some(fence) = fence_at(p, from) {
        fenced_code(p, depth, fence);
    } else if p.quote_prefix(from).is_some() {
        block_quote(p, depth);
    } else if let Some(marker) = list_marker_at(p, from) {
        list(p, depth, marker);
    } else {
        paragraph(p);
    }
}

fn blank_line(p: &mut Parser<'_, '_>) {
    spacing(p);
    if p.at(SyntaxKind::NEWLINE) {
        p.bump_as(SyntaxKind::BLANK_LINE);
        p.start_line();
    }
}

/// First non-whitespace token at `from`, if it is indented at most three columns.
fn indented(p: &Parser<'_, '_>, from: usize) -> Option<usize> {
    let first = p.skip_whitespace(from);
    (p.column(first) - p.column(from) <= MAX_INDENT).then_some(first)
}

/// Length of the run of `kind` tokens starting at `from`.
fn run_length(p: &Parser<'_, '_>, from: usize, kind: SyntaxKind) -> usize {
    let mut i = from;
    while p.kind_at(i) == kind {
        i += 1;
    }
    i - from
}

// === Thematic break ===

/// Three or more `-`, `*` or `_` alone on a line, spaces allowed between.
fn at_thematic_break(p: &Parser<'_, '_>, from: usize) -> bool {
    let Some(first) = indented(p, from) else {
        return false;
    };
    let marker = p.kind_at(first);
    if !matches!(
        marker,
        SyntaxKind::DASH | SyntaxKind::STAR | SyntaxKind::UNDERSCORE
    ) {
        return false;
    }

    let mut count = 0;
    for i in first..p.line_end(first) {
        match p.kind_at(i) {
            k if k == marker => count += 1,
            SyntaxKind::WHITESPACE => {}
            _ => return false,
        }
    }
    count >= 3
}

fn thematic_break(p: &mut Parser<'_, '_>) {
    let m = p.start();
    spacing(p);
    let end = p.line_end(p.pos());
    while p.pos() < end {
        if p.at(SyntaxKind::WHITESPACE) {
            p.bump_as(SyntaxKind::SPACING);
        } else {
            p.bump_as(SyntaxKind::MARKER);
        }
    }
    m.complete(p, SyntaxKind::THEMATIC_BREAK);
    p.next_line();
}

// === ATX heading ===

/// `#` to `######` followed by whitespace or the end of the line.
fn heading_level(p: &Parser<'_, '_>, from: usize) -> Option<usize> {
    let first = indented(p, from)?;
    let level = run_length(p, first, SyntaxKind::HASH);
    let after = p.kind_at(first + level);
    ((1..=6).contains(&level)
        && matches!(
            after,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::EOF
        ))
    .then_some(level)
}

fn heading(p: &mut Parser<'_, '_>, level: usize) {
    let m = p.start();
    spacing(p);
    p.bump_n(level, SyntaxKind::HEADING_MARKER);
    spacing(p);

    let end = trim_end(p, p.line_end(p.pos()));
    inline::inline(p, end);
    spacing(p);

    m.complete(p, SyntaxKind::HEADING);
    p.next_line();
}

// === Fenced code ===

#[derive(Debug, Clone, Copy)]
struct Fence {
    kind: SyntaxKind,
    length: usize,
    indent: usize,
}

/// Three or more backticks or tildes. A backtick fence's info string may
/// not contain backticks (that line is a code span instead).
fn fence_at(p: &Parser<'_, '_>, from: usize) -> Option<Fence> {
    let first = indented(p, from)?;
    let kind = p.kind_at(first);
    if !matches!(kind, SyntaxKind::BACKTICK | SyntaxKind::TILDE) {
        return None;
    }
    let length = run_length(p, first, kind);
    if length < 3 {
        return None;
    }
    if kind == SyntaxKind::BACKTICK
        && (first + length..p.line_end(first)).any(|i| p.kind_at(i) == SyntaxKind::BACKTICK)
    {
        return None;
    }
    Some(Fence {
        kind,
        length,
        indent: p.column(first) - p.column(from),
    })
}

/// A closing fence: same character, at least as long, nothing else on the line.
fn closing_fence(p: &Parser<'_, '_>, from: usize, fence: Fence) -> Option<usize> {
    let first = indented(p, from)?;
    let length = run_length(p, first, fence.kind);
    let rest = p.skip_whitespace(first + length);
    (length >= fence.length && rest == p.line_end(first)).then_some(length)
}

fn fenced_code(p: &mut Parser<'_, '_>, depth: usize, fence: Fence) {
    let m = p.start();
    let open_start = p.pos();

    spacing(p);
    p.bump_n(fence.length, SyntaxKind::MARKER);
    spacing(p);

    let info_end = trim_end(p, p.line_end(p.pos()));
    if p.pos() < info_end {
        let info = p.start();
        while p.pos() < info_end {
            p.bump();
        }
        info.complete(p, SyntaxKind::CODE_INFO);
    }
    spacing(p);
    let open_end = p.pos();

    let has_body = p.eat(SyntaxKind::NEWLINE);
    if has_body {
        p.start_line();
    }

    let content = p.start();
    let mut closing = None;
    while has_body && !p.at_end() && p.matched() >= depth {
        if let Some(length) = closing_fence(p, p.pos(), fence) {
            closing = Some(length);
            break;
        }

        // Strip the opening fence's indentation from content lines
        let line_start = p.pos();
        let mut i = line_start;
        while p.kind_at(i) == SyntaxKind::WHITESPACE
            && p.column(i) - p.column(line_start) < fence.indent
        {
            i += 1;
        }
        p.bump_to(i, SyntaxKind::SPACING);

        let end = p.line_end(p.pos());
        if p.kind_at(end) == SyntaxKind::NEWLINE {
            p.bump_to(end + 1, SyntaxKind::TEXT);
            p.start_line();
        } else {
            p.bump_to(end, SyntaxKind::TEXT);
        }
    }
    content.complete(p, SyntaxKind::CODE_CONTENT);

    match closing {
        Some(length) => {
            spacing(p);
            p.bump_n(length, SyntaxKind::MARKER);
            spacing(p);
            m.complete(p, SyntaxKind::FENCED_CODE);
            p.next_line();
        }
        None => {
            p.error(
                "unclosed-fence",
                "Code fence is never closed",
                open_start,
                open_end,
            );
            m.complete(p, SyntaxKind::FENCED_CODE);
        }
    }
}

// === Block quote ===

fn block_quote(p: &mut Parser<'_, '_>, depth: usize) {
    let m = p.start();

    spacing(p);
    p.bump_as(SyntaxKind::MARKER);
    if p.at(SyntaxKind::WHITESPACE) {
        p.bump_as(SyntaxKind::SPACING);
    }

    p.push_container(Container::Quote);
    blocks(p, depth + 1);
    p.pop_container();

    m.complete(p, SyntaxKind::BLOCK_QUOTE);
}

// === Lists ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    /// `-`, `*` or `+`
    Bullet(SyntaxKind),
    /// Ordinal followed by `.` or `)`
    Ordered(char),
}

#[derive(Debug, Clone, Copy)]
struct ListMarker {
    kind: ListKind,
    /// Raw tokens making up the marker
    tokens: usize,
}

/// A bullet or an ordinal (at most nine digits) followed by whitespace or
/// the end of the line.
fn list_marker_at(p: &Parser<'_, '_>, from: usize) -> Option<ListMarker> {
    let first = indented(p, from)?;
    let marker = match p.kind_at(first) {
        kind @ (SyntaxKind::DASH | SyntaxKind::STAR | SyntaxKind::PLUS) => ListMarker {
            kind: ListKind::Bullet(kind),
            tokens: 1,
        },
        SyntaxKind::TEXT => {
            let text = p.text_at(first);
            let is_ordinal =
                |digits: &str| (1..=9).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit());
            if text.strip_suffix('.').is_some_and(is_ordinal) {
                ListMarker {
                    kind: ListKind::Ordered('.'),
                    tokens: 1,
                }
            } else if is_ordinal(text) && p.kind_at(first + 1) == SyntaxKind::RPAREN {
                ListMarker {
                    kind: ListKind::Ordered(')'),
                    tokens: 2,
                }
            } else {
                return None;
            }
        }
        _ => return None,
    };

    matches!(
        p.kind_at(first + marker.tokens),
        SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::EOF
    )
    .then_some(marker)
}

fn list(p: &mut Parser<'_, '_>, depth: usize, marker: ListMarker) {
    let first = list_item(p, depth, marker);
    let m = first.precede(p);

    while !p.at_end() && p.matched() >= depth {
        let from = p.pos();
        if at_thematic_break(p, from) {
            break;
        }
        match list_marker_at(p, from) {
            Some(next) if next.kind == marker.kind => {
                list_item(p, depth, next);
            }
            _ => break,
        }
    }

    m.complete(p, SyntaxKind::LIST);
}

fn list_item(p: &mut Parser<'_, '_>, depth: usize, marker: ListMarker) -> CompletedMarker {
    let m = p.start();

    spacing(p);
    p.bump_n(marker.tokens, SyntaxKind::LIST_MARKER);

    let after = p.pos();
    let content = p.skip_whitespace(after);
    let width = p.column(content) - p.column(after);
    let content_column = if p.is_blank_from(after) {
        p.column(after) + 1
    } else if width > 4 {
        // Only one space belongs to the marker, the rest is content indentation
        p.bump_as(SyntaxKind::SPACING);
        p.column(after) + 1
    } else {
        p.bump_to(content, SyntaxKind::SPACING);
        p.column(content)
    };

    p.push_container(Container::Item { content_column });
    blocks(p, depth + 1);
    p.pop_container();

    m.complete(p, SyntaxKind::LIST_ITEM)
}

// === Paragraph ===

fn paragraph(p: &mut Parser<'_, '_>) {
    let m = p.start();

    loop {
        spacing(p);
        let line_end = p.line_end(p.pos());
        let continues = paragraph_continues(p, line_end);
        let content_end = trim_end(p, line_end);
        let trailing = p.column(line_end) - p.column(content_end);

        if continues && trailing >= 2 {
            inline::inline(p, content_end);
            hard_break(p, line_end);
        } else if continues
            && trailing == 0
            && content_end > p.pos()
            && p.kind_at(content_end - 1) == SyntaxKind::BACKSLASH
        {
            inline::inline(p, content_end - 1);
            hard_break(p, line_end);
        } else {
            inline::inline(p, content_end);
            spacing(p);
            if !continues {
                break;
            }
            p.bump_as(SyntaxKind::SOFT_BREAK);
            p.start_line();
        }
    }

    m.complete(p, SyntaxKind::PARAGRAPH);
    p.next_line();
}

/// Trailing spaces or backslash, plus the line ending.
fn hard_break(p: &mut Parser<'_, '_>, line_end: usize) {
    let m = p.start();
    p.bump_to(line_end, SyntaxKind::MARKER);
    p.bump();
    m.complete(p, SyntaxKind::HARD_BREAK);
    p.start_line();
}

/// Whether the line after `line_end` continues the current paragraph: all
/// containers match, it is not blank, and it does not start another block.
fn paragraph_continues(p: &Parser<'_, '_>, line_end: usize) -> bool {
    if p.kind_at(line_end) != SyntaxKind::NEWLINE {
        return false;
    }
    let (matched, start) = p.scan_prefixes(line_end + 1);
    if matched < p.depth() || p.is_blank_from(start) {
        return false;
    }
    !interrupts_paragraph(p, start)
}

fn interrupts_paragraph(p: &Parser<'_, '_>, from: usize) -> bool {
    if at_thematic_break(p, from)
        || heading_level(p, from).is_some()
        || fence_at(p, from).is_some()
        || p.quote_prefix(from).is_some()
    {
        return true;
    }
    // An empty list item cannot interrupt a paragraph
    list_marker_at(p, from).is_some_and(|marker| {
        let first = p.skip_whitespace(from);
        !p.is_blank_from(first + marker.tokens)
    })
}
