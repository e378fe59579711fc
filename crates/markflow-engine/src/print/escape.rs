//! Backslash escaping of literal text.
//!
//! Text is escaped just enough that scanning the printed output gives the
//! same value back: characters that start inline constructs are always
//! escaped, characters that only start blocks are escaped at the start of a
//! line.

/// Characters that open or close inline constructs anywhere.
const INLINE: &[char] = &['\\', '*', '_', '`', '[', ']'];

/// Characters that open blocks when they start a line.
const LINE_START: &[char] = &['#', '>', '-', '+', '~'];

/// Escape a text value.
///
/// `line_start` says whether the value begins a line of output. `before_link`
/// says whether a link follows directly, in which case a trailing `!` would
/// turn it into an image.
pub fn text(value: &str, line_start: bool, before_link: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    let mut at_line_start = line_start;
    let mut escape_at = None;

    for (i, &c) in chars.iter().enumerate() {
        if at_line_start {
            escape_at = ordinal_end(&chars[i..]).map(|end| i + end);
        }

        let escape = INLINE.contains(&c)
            || (at_line_start && LINE_START.contains(&c))
            || escape_at == Some(i)
            || (c == '!' && before_link && i + 1 == chars.len());
        if escape {
            out.push('\\');
        }
        out.push(c);
        at_line_start = c == '\n';
    }
    out
}

/// Index of the `.` or `)` closing a leading digit run, if the line starts
/// like an ordered list marker.
fn ordinal_end(line: &[char]) -> Option<usize> {
    let digits = line.iter().take_while(|c| c.is_ascii_digit()).count();
    (digits > 0 && matches!(line.get(digits), Some('.' | ')'))).then_some(digits)
}

/// Escape a link title for use between double quotes.
pub fn title(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Write a link destination, in angle brackets when the bare form would
/// not scan back.
pub fn destination(value: &str) -> String {
    let bare = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>'));

    let mut out = String::with_capacity(value.len() + 2);
    if bare {
        for c in value.chars() {
            if c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
    } else {
        out.push('<');
        for c in value.chars() {
            if matches!(c, '<' | '>' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('>');
    }
    out
}

/// Escape a code block info string written after a fence of `fence`
/// characters: backslashes, and a leading fence character that would
/// otherwise lengthen the fence.
pub fn info(value: &str, fence: char) -> String {
    let escaped = value.replace('\\', "\\\\");
    if escaped.starts_with(fence) {
        format!("\\{escaped}")
    } else {
        escaped
    }
}
