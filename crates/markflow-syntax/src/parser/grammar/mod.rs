//! # Grammar Rules
//!
//! Each function takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect tokens (`p.current()`, `p.at()`, `p.kind_at()`)
//! 2. Consume tokens (`p.bump()`, `p.bump_as()`, `p.bump_to()`)
//! 3. Build tree structure (`p.start()` → marker → `complete()`/`abandon()`)
//!
//! ## Module Structure
//!
//! - [`block`] - Block-level elements, container prefixes and line handling
//! - [`inline`] - Inline elements (code spans, links, emphasis, escapes)
//!
//! ## Error Recovery
//!
//! Grammar functions never fail. Constructs that do not close are kept as
//! plain tokens, a [`SyntaxError`](crate::parser::SyntaxError) is recorded,
//! and every input byte still lands in the tree.

mod block;
mod inline;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root document.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();

    p.start_line();
    block::blocks(p, 0);

    while !p.at_end() {
        p.bump();
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// Consume the whitespace at the current position as one SPACING token.
fn spacing(p: &mut Parser<'_, '_>) {
    let end = p.skip_whitespace(p.pos());
    p.bump_to(end, SyntaxKind::SPACING);
}

/// Index just past the last non-whitespace token in `[p.pos(), end)`.
fn trim_end(p: &Parser<'_, '_>, end: usize) -> usize {
    let mut i = end;
    while i > p.pos() && p.kind_at(i - 1) == SyntaxKind::WHITESPACE {
        i -= 1;
    }
    i
}
