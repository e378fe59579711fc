//! SyntaxKind enum for all tokens and nodes in the Markdown CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the Markdown CST.
///
/// This enum represents both tokens (lexer output, plus a few kinds the parser
/// assigns when it regroups raw tokens) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// A single space or tab
    WHITESPACE,
    /// Line ending
    NEWLINE,
    /// Plain text content
    TEXT,
    /// `>` for blockquotes
    GT,
    /// `<` for angle-bracket link destinations
    LT,
    /// `-` for lists and thematic breaks
    DASH,
    /// `*` for lists, emphasis, and thematic breaks
    STAR,
    /// `+` for lists
    PLUS,
    /// `_` for emphasis and thematic breaks
    UNDERSCORE,
    /// Single backtick for code spans and fences
    BACKTICK,
    /// `~` for fenced code
    TILDE,
    /// `[` for links and images
    LBRACKET,
    /// `]` for links and images
    RBRACKET,
    /// `(` for link destinations
    LPAREN,
    /// `)` for link destinations and ordered list markers
    RPAREN,
    /// `#` for headings
    HASH,
    /// `!` for images
    BANG,
    /// `"` for link titles
    QUOTE,
    /// Backslash followed by ASCII punctuation (`\*`)
    ESCAPE,
    /// Backslash not followed by punctuation
    BACKSLASH,

    // === Tokens assigned by the parser ===
    /// Container prefix at the start of a line (`> `, list item indentation)
    PREFIX,
    /// Whitespace that carries no meaning (indentation, trailing spaces)
    SPACING,
    /// Line ending of a blank line
    BLANK_LINE,
    /// Line ending inside a paragraph
    SOFT_BREAK,
    /// Run of `#` opening a heading
    HEADING_MARKER,
    /// Bullet or ordinal opening a list item (`-`, `1.`, `3)`)
    LIST_MARKER,
    /// Any other construct delimiter (brackets, backticks, emphasis runs, fences)
    MARKER,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// Blockquote container (`> ...`)
    BLOCK_QUOTE,
    /// List container (ordered or unordered)
    LIST,
    /// Individual list item
    LIST_ITEM,
    /// Paragraph block
    PARAGRAPH,
    /// ATX heading (`# ...`)
    HEADING,
    /// Thematic break (`---`, `***`, etc.)
    THEMATIC_BREAK,
    /// Fenced code block
    FENCED_CODE,
    /// Info string of a fenced code block
    CODE_INFO,
    /// Body of a fenced code block
    CODE_CONTENT,
    /// Inline code span
    CODE_SPAN,
    /// Emphasis `*text*`
    EMPHASIS,
    /// Strong emphasis `**text**`
    STRONG,
    /// Standard link `[text](url)`
    LINK,
    /// Image `![alt](url)`
    IMAGE,
    /// Bracketed text of a link or image
    LINK_TEXT,
    /// Destination of a link or image
    LINK_DESTINATION,
    /// Quoted title of a link or image
    LINK_TITLE,
    /// Hard line break (two trailing spaces or a trailing backslash)
    HARD_BREAK,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer or parser-assigned).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia: it never contributes to a value.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::NEWLINE | Self::PREFIX | Self::SPACING | Self::BLANK_LINE
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkdownLang {}

impl rowan::Language for MarkdownLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::HARD_BREAK as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<MarkdownLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<MarkdownLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<MarkdownLang>;
