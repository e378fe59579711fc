//! Formatting choices of the [`MarkdownPrinter`](super::MarkdownPrinter).
//!
//! Every choice only changes how a tree is written, never what it means:
//! text printed with any set of options scans back to the same tree.

use serde::{Deserialize, Serialize};

/// Bullet character of an unordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bullet {
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "+")]
    Plus,
}

impl Bullet {
    pub fn as_char(self) -> char {
        match self {
            Self::Dash => '-',
            Self::Star => '*',
            Self::Plus => '+',
        }
    }

    /// A bullet different from `self`.
    pub fn other(self) -> Self {
        match self {
            Self::Dash => Self::Star,
            Self::Star | Self::Plus => Self::Dash,
        }
    }
}

/// Character following the number of an ordered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    #[serde(rename = ".")]
    Period,
    #[serde(rename = ")")]
    Paren,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Self::Period => '.',
            Self::Paren => ')',
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Period => Self::Paren,
            Self::Paren => Self::Period,
        }
    }
}

/// Character wrapping emphasis and strong emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmphasisMarker {
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "_")]
    Underscore,
}

impl EmphasisMarker {
    pub fn as_char(self) -> char {
        match self {
            Self::Star => '*',
            Self::Underscore => '_',
        }
    }
}

/// Fence character of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fence {
    #[serde(rename = "`")]
    Backtick,
    #[serde(rename = "~")]
    Tilde,
}

impl Fence {
    pub fn as_char(self) -> char {
        match self {
            Self::Backtick => '`',
            Self::Tilde => '~',
        }
    }
}

/// Character of a thematic break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "_")]
    Underscore,
}

impl Rule {
    pub fn as_char(self) -> char {
        match self {
            Self::Dash => '-',
            Self::Star => '*',
            Self::Underscore => '_',
        }
    }
}

/// How a hard line break is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakStyle {
    /// A backslash before the line ending
    Backslash,
    /// Two spaces before the line ending
    Spaces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    pub bullet: Bullet,
    /// Used for a list directly following another list with `bullet`
    pub bullet_other: Bullet,
    pub ordered_delimiter: Delimiter,
    pub emphasis: EmphasisMarker,
    pub strong: EmphasisMarker,
    pub fence: Fence,
    pub rule: Rule,
    pub break_style: BreakStyle,
    /// Number ordered items upwards from the list start; otherwise every
    /// item repeats the start number
    pub increment_list_marker: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            bullet: Bullet::Dash,
            bullet_other: Bullet::Star,
            ordered_delimiter: Delimiter::Period,
            emphasis: EmphasisMarker::Star,
            strong: EmphasisMarker::Star,
            fence: Fence::Backtick,
            rule: Rule::Dash,
            break_style: BreakStyle::Backslash,
            increment_list_marker: true,
        }
    }
}

impl FormatOptions {
    /// `bullet_other`, unless it equals `bullet`.
    pub(crate) fn alternate_bullet(&self) -> Bullet {
        if self.bullet_other == self.bullet {
            self.bullet.other()
        } else {
            self.bullet_other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_characters() {
        let options: FormatOptions = serde_json::from_value(serde_json::json!({
            "bullet": "*",
            "emphasis": "_",
            "ordered_delimiter": ")",
            "break_style": "spaces",
        }))
        .expect("valid options");

        assert_eq!(
            options,
            FormatOptions {
                bullet: Bullet::Star,
                emphasis: EmphasisMarker::Underscore,
                ordered_delimiter: Delimiter::Paren,
                break_style: BreakStyle::Spaces,
                ..FormatOptions::default()
            }
        );
    }

    #[test]
    fn rejects_unknown_characters_and_fields() {
        assert!(
            serde_json::from_value::<FormatOptions>(serde_json::json!({ "bullet": "x" })).is_err()
        );
        assert!(
            serde_json::from_value::<FormatOptions>(serde_json::json!({ "colour": "red" })).is_err()
        );
    }

    #[test]
    fn alternate_bullet_differs() {
        let same = FormatOptions {
            bullet: Bullet::Star,
            bullet_other: Bullet::Star,
            ..FormatOptions::default()
        };
        assert_eq!(same.alternate_bullet(), Bullet::Dash);
        assert_eq!(FormatOptions::default().alternate_bullet(), Bullet::Star);
    }
}
