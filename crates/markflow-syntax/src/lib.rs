//! # markflow-syntax
//!
//! A lossless Markdown syntax tree using [Rowan] + [Logos], following the
//! [rust-analyzer] architecture model. This is the front half of the markflow
//! scanner: `markflow-engine` lowers the tree produced here into its
//! document model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! - [`lexer`] breaks the input into context-free tokens. Every byte lands in
//!   exactly one token.
//! - [`parser`] walks the tokens with the grammar rules, tracking the open
//!   container blocks (block quotes, list items) line by line, and emits a
//!   flat event list. Constructs that never close are kept as text and
//!   reported as [`SyntaxError`]s.
//! - [`parser::sink`] builds the Rowan green tree from the events.
//!
//! ## Module Structure
//!
//! ```text
//! markflow-syntax/
//! ├── lib.rs           # This file - public API
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Logos-based tokenizer
//! └── parser/
//!     ├── mod.rs       # Parser struct, containers, Marker system, parse()
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/
//!         ├── mod.rs   # Root document parsing
//!         ├── block.rs # Block-level elements
//!         └── inline.rs# Inline elements
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use markflow_syntax::{parse, SyntaxKind};
//!
//! let tree = parse("# Hello\n");
//!
//! assert_eq!(tree.text().to_string(), "# Hello\n");
//! assert_eq!(tree.kind(), SyntaxKind::ROOT);
//! let heading = tree.children().next().unwrap();
//! assert_eq!(heading.kind(), SyntaxKind::HEADING);
//! ```

pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use parser::{Parse, SyntaxError, parse, parse_with_errors};
pub use syntax_kind::{MarkdownLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
