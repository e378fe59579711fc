//! Default handlers, one per node kind.

use std::collections::HashMap;

use crate::tree::{Node, NodeKind, NodeType};

use super::{Handler, handler};
use super::context::{Frame, State};
use super::escape;
use super::options::BreakStyle;

pub(super) fn defaults() -> HashMap<NodeType, Handler> {
    let table: [(NodeType, Handler); 15] = [
        (NodeType::Root, handler(root)),
        (NodeType::Heading, handler(heading)),
        (NodeType::Paragraph, handler(paragraph)),
        (NodeType::Text, handler(text)),
        (NodeType::Emphasis, handler(emphasis)),
        (NodeType::Strong, handler(strong)),
        (NodeType::List, handler(list)),
        (NodeType::ListItem, handler(list_item)),
        (NodeType::Link, handler(link)),
        (NodeType::Image, handler(image)),
        (NodeType::CodeBlock, handler(code_block)),
        (NodeType::InlineCode, handler(inline_code)),
        (NodeType::Break, handler(hard_break)),
        (NodeType::BlockQuote, handler(block_quote)),
        (NodeType::ThematicBreak, handler(thematic_break)),
    ];
    table.into_iter().collect()
}

/// Prefix every line of `content`: `first` on the first line, `rest` on the
/// others. Empty lines get the prefix without trailing spaces.
fn indent(content: &str, first: &str, rest: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let prefix = if i == 0 { first } else { rest };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    out
}

fn longest_run(value: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in value.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn root(node: &Node, state: &mut State<'_>) -> String {
    state.blocks(node)
}

fn heading(node: &Node, state: &mut State<'_>) -> String {
    let depth = match node.kind {
        NodeKind::Heading { depth } => depth.clamp(1, 6),
        _ => 1,
    };
    state.enter(Frame::Heading);
    let content = state.inlines(node);
    state.exit();

    let marker = "#".repeat(usize::from(depth));
    let content = content.trim();
    if content.is_empty() {
        marker
    } else {
        format!("{marker} {content}")
    }
}

fn paragraph(node: &Node, state: &mut State<'_>) -> String {
    state.enter(Frame::Paragraph);
    let content = state.inlines(node);
    state.exit();
    content.trim_matches([' ', '\t', '\n']).to_string()
}

/// Text is printed with its line structure normalized: whitespace around
/// line endings is dropped, as are blank lines, which would end the
/// paragraph. Leading whitespace of a line has no representation and is
/// dropped too.
fn text(node: &Node, state: &mut State<'_>) -> String {
    let separator = if state.on_one_line() { " " } else { "\n" };
    let value = normalize_lines(node.value(), separator);
    let value = if state.peers.line_start {
        value.trim_start_matches([' ', '\t', '\n'])
    } else {
        &value
    };
    escape::text(value, state.peers.line_start, state.peers.before_link)
}

fn normalize_lines(value: &str, separator: &str) -> String {
    if !value.contains('\n') {
        return value.to_string();
    }
    let lines: Vec<&str> = value.split('\n').collect();
    let last = lines.len() - 1;
    let mut kept = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        let mut line = line;
        if i > 0 {
            line = line.trim_start_matches([' ', '\t']);
        }
        if i < last {
            line = line.trim_end_matches([' ', '\t']);
        }
        if line.is_empty() && i > 0 && i < last {
            continue;
        }
        kept.push(line);
    }
    kept.join(separator)
}

/// Pick the emphasis character: the preferred one unless it touches the same
/// character outside, and never `_` next to a letter or digit.
fn emphasis_marker(preferred: char, state: &State<'_>) -> char {
    let peers = state.peers;
    let touches = |c: char| peers.before == Some(c) || peers.after == Some(c);

    let mut marker = preferred;
    if touches(marker) {
        marker = if marker == '*' { '_' } else { '*' };
    }
    let intraword = peers.before.is_some_and(char::is_alphanumeric)
        || peers.after.is_some_and(char::is_alphanumeric);
    if marker == '_' && intraword {
        marker = '*';
    }
    marker
}

fn emphasis(node: &Node, state: &mut State<'_>) -> String {
    let marker = emphasis_marker(state.options().emphasis.as_char(), state);
    state.enter(Frame::Emphasis(marker));
    let content = state.inlines(node);
    state.exit();
    delimit(&content, &marker.to_string())
}

/// Wrap `content` in `delimiter`, keeping edge whitespace outside: a
/// delimiter next to a space cannot open or close.
fn delimit(content: &str, delimiter: &str) -> String {
    let inner = content.trim_matches([' ', '\t']);
    if inner.is_empty() {
        return content.to_string();
    }
    let start = content.len() - content.trim_start_matches([' ', '\t']).len();
    let end = start + inner.len();
    format!(
        "{}{delimiter}{inner}{delimiter}{}",
        &content[..start],
        &content[end..]
    )
}

fn strong(node: &Node, state: &mut State<'_>) -> String {
    let marker = emphasis_marker(state.options().strong.as_char(), state);
    state.enter(Frame::Strong(marker));
    let content = state.inlines(node);
    state.exit();
    delimit(&content, &format!("{marker}{marker}"))
}

fn list(node: &Node, state: &mut State<'_>) -> String {
    let NodeKind::List {
        ordered,
        start,
        spread,
    } = node.kind
    else {
        return state.blocks(node);
    };

    let options = state.options();
    let candidates = if ordered {
        [
            options.ordered_delimiter.as_char(),
            options.ordered_delimiter.other().as_char(),
        ]
    } else {
        [
            options.bullet.as_char(),
            options.alternate_bullet().as_char(),
        ]
    };
    let avoid = state.avoid_marker.take();
    let marker = candidates
        .into_iter()
        .find(|c| Some(*c) != avoid)
        .unwrap_or(candidates[0]);

    state.enter(Frame::List {
        ordered,
        spread,
        marker,
        number: start.unwrap_or(1),
    });
    let content = state.blocks(node);
    state.exit();
    state.list_marker = Some(marker);
    content
}

fn list_item(node: &Node, state: &mut State<'_>) -> String {
    let marker = state.next_item_marker();
    state.enter(Frame::ListItem);
    let content = state.blocks(node);
    state.exit();

    if content.is_empty() {
        return marker;
    }
    let rest = " ".repeat(marker.chars().count() + 1);
    indent(&content, &format!("{marker} "), &rest)
}

fn link(node: &Node, state: &mut State<'_>) -> String {
    let NodeKind::Link { destination, title } = &node.kind else {
        return String::new();
    };
    state.enter(Frame::Link);
    let content = state.inlines(node);
    state.exit();
    format!("[{content}]({})", resource(destination, title.as_deref()))
}

fn image(node: &Node, _state: &mut State<'_>) -> String {
    let NodeKind::Image {
        destination,
        title,
        alt,
    } = &node.kind
    else {
        return String::new();
    };
    format!(
        "![{}]({})",
        escape::text(alt, false, false),
        resource(destination, title.as_deref())
    )
}

fn resource(destination: &str, title: Option<&str>) -> String {
    let destination = escape::destination(destination);
    match title {
        Some(title) => format!("{destination} {}", escape::title(title)),
        None => destination,
    }
}

fn code_block(node: &Node, state: &mut State<'_>) -> String {
    let NodeKind::CodeBlock { lang, meta } = &node.kind else {
        return String::new();
    };
    let info = match (lang, meta) {
        (Some(lang), Some(meta)) => format!("{lang} {meta}"),
        (Some(lang), None) => lang.clone(),
        (None, Some(meta)) => meta.clone(),
        (None, None) => String::new(),
    };

    let fence_char = choose_fence(state.options().fence.as_char(), &info);
    let value = node.value();
    let length = (longest_run(value, fence_char) + 1).max(3);
    let fence: String = std::iter::repeat_n(fence_char, length).collect();

    format!("{fence}{}\n{value}\n{fence}", escape::info(&info, fence_char))
}

/// The fence character for a code block with `info`. A backtick fence cannot
/// carry backticks in its info, and info starting with the fence character
/// would lengthen the fence; when neither fence fits, a tilde fence is used
/// and [`escape::info`] escapes the leading tilde.
fn choose_fence(preferred: char, info: &str) -> char {
    let other = if preferred == '`' { '~' } else { '`' };
    let fits = |c: char| !info.starts_with(c) && !(c == '`' && info.contains('`'));
    [preferred, other].into_iter().find(|c| fits(*c)).unwrap_or('~')
}

fn inline_code(node: &Node, _state: &mut State<'_>) -> String {
    let value = node.value();
    let ticks = (1..)
        .find(|n| lacks_run(value, '`', *n))
        .unwrap_or(1);
    let fence = "`".repeat(ticks);

    let all_spaces = value.chars().all(|c| c == ' ');
    let pad = value.starts_with('`')
        || value.ends_with('`')
        || (value.starts_with(' ') && value.ends_with(' ') && !all_spaces);
    if pad {
        format!("{fence} {value} {fence}")
    } else {
        format!("{fence}{value}{fence}")
    }
}

/// Whether no run of `c` in `value` is exactly `n` long.
fn lacks_run(value: &str, c: char, n: usize) -> bool {
    let mut current = 0;
    for ch in value.chars().chain(std::iter::once('\0')) {
        if ch == c {
            current += 1;
        } else {
            if current == n {
                return false;
            }
            current = 0;
        }
    }
    true
}

/// A break ending its paragraph has nothing to break and prints nothing.
/// Trailing spaces cannot follow whitespace or start a line, so those
/// breaks use a backslash whatever the style.
fn hard_break(_node: &Node, state: &mut State<'_>) -> String {
    if state.peers.last {
        return String::new();
    }
    if state.on_one_line() {
        return " ".to_string();
    }
    let after_text = state.peers.before.is_some_and(|c| !c.is_whitespace());
    match state.options().break_style {
        BreakStyle::Spaces if after_text => "  \n".to_string(),
        _ => "\\\n".to_string(),
    }
}

fn block_quote(node: &Node, state: &mut State<'_>) -> String {
    state.enter(Frame::BlockQuote);
    let content = state.blocks(node);
    state.exit();
    indent(&content, "> ", "> ")
}

/// Three rule characters. Inside a list with the same bullet the break would
/// read as an item, so another character is used.
fn thematic_break(_node: &Node, state: &mut State<'_>) -> String {
    let bullets: Vec<char> = state
        .stack()
        .iter()
        .filter_map(|frame| match frame {
            Frame::List {
                ordered: false,
                marker,
                ..
            } => Some(*marker),
            _ => None,
        })
        .collect();
    let preferred = state.options().rule.as_char();
    let rule = ['-', '*', '_']
        .into_iter()
        .find(|c| *c == preferred && !bullets.contains(c))
        .unwrap_or('_');
    std::iter::repeat_n(rule, 3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn indent_prefixes_lines() {
        assert_eq!(indent("a\n\nb", "- ", "  "), "- a\n\n  b");
        assert_eq!(indent("a\n\nb", "> ", "> "), "> a\n>\n> b");
    }

    #[rstest]
    #[case("a", "\n", "a")]
    #[case("a \n b", "\n", "a\nb")]
    #[case("a\n\n\nb", "\n", "a\nb")]
    #[case("a\n \nb", " ", "a b")]
    #[case("a\n", "\n", "a\n")]
    fn lines_are_normalized(#[case] value: &str, #[case] separator: &str, #[case] expected: &str) {
        assert_eq!(normalize_lines(value, separator), expected);
    }

    #[rstest]
    #[case('`', "rust", '`')]
    #[case('~', "rust", '~')]
    #[case('`', "a`b", '~')]
    #[case('~', "~~~", '`')]
    #[case('`', "~`", '~')]
    fn fence_character(#[case] preferred: char, #[case] info: &str, #[case] expected: char) {
        assert_eq!(choose_fence(preferred, info), expected);
    }

    #[test]
    fn delimiters_skip_edge_spaces() {
        assert_eq!(delimit(" x ", "*"), " *x* ");
        assert_eq!(delimit("x", "__"), "__x__");
        assert_eq!(delimit("  ", "*"), "  ");
    }

    #[rstest]
    #[case("", 1)]
    #[case("a`b", 2)]
    #[case("a``b`c", 3)]
    #[case("``", 1)]
    fn shortest_absent_backtick_run(#[case] value: &str, #[case] expected: usize) {
        let ticks = (1..)
            .find(|n| lacks_run(value, '`', *n))
            .unwrap_or(1);
        assert_eq!(ticks, expected);
    }
}
