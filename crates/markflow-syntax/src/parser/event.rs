//! # Parser Events
//!
//! Events are the intermediate representation between parsing and tree building.
//! Instead of building the tree directly, the parser emits a **flat sequence**
//! of events that describe the tree structure:
//!
//! ```text
//! Start(HEADING)
//!   Token(HEADING_MARKER)
//!   Token(SPACING)
//!   Token(TEXT)
//! Finish
//! Token(NEWLINE)
//! ```
//!
//! The Sink processes these in order, maintaining a stack of open nodes.
//! Start pushes, Finish pops.
//!
//! ## Forward Parent Links
//!
//! The `forward_parent` field in `Start` handles cases where we need to wrap
//! an already-parsed node. A list is only known to be a list once its first
//! item has been parsed, so the LIST node is started by preceding the first
//! LIST_ITEM. The Sink resolves these links by following the chain and opening
//! nodes in outermost-first order.

use crate::syntax_kind::SyntaxKind;

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    ///
    /// If `forward_parent` is set, it points to another `Start` event that
    /// becomes this node's parent.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Add a token to the current node.
    ///
    /// The `kind` may differ from the lexer kind: the grammar re-tags tokens
    /// (a `*` becomes LIST_MARKER or MARKER) and groups several raw tokens
    /// into one (`n_raw_tokens`).
    Token { kind: SyntaxKind, n_raw_tokens: u32 },

    /// Finish the current node.
    Finish,

    /// A placeholder left by `parser.start()`; replaced on `complete()`,
    /// ignored by the Sink when abandoned.
    Placeholder,
}

impl Event {
    /// Create a start event with no forward parent.
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    /// Create a token event for a single raw token.
    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token {
            kind,
            n_raw_tokens: 1,
        }
    }
}
