//! # Printer
//!
//! Turns a document tree back into text.
//!
//! [`MarkdownPrinter`] keeps one [`Handler`] per node kind. Handlers print
//! their node and recurse through [`State`], which carries the stack of
//! constructs being printed for the duration of a single call. Any handler
//! can be swapped with [`MarkdownPrinter::with_handler`].
//!
//! Printed text scans back to the same tree (ignoring positions and data)
//! whatever [`FormatOptions`] are used. The exact bytes of the original
//! source are not preserved.

mod context;
mod escape;
mod handlers;
pub mod options;

pub use context::{Frame, Peers, State};
pub use options::FormatOptions;

use std::collections::HashMap;
use std::sync::Arc;

use crate::tree::{Node, NodeType};

/// Tree → text stage of a [`Processor`](crate::Processor).
pub trait Printer: Send + Sync {
    fn print(&self, tree: &Node) -> String;
}

/// Prints one node. Handlers recurse into children through the [`State`].
pub type Handler = Arc<dyn Fn(&Node, &mut State<'_>) -> String + Send + Sync>;

/// Wrap a function as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Node, &mut State<'_>) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The default printer for the markflow Markdown dialect.
#[derive(Clone)]
pub struct MarkdownPrinter {
    options: FormatOptions,
    handlers: HashMap<NodeType, Handler>,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

impl std::fmt::Debug for MarkdownPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownPrinter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MarkdownPrinter {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            options,
            handlers: handlers::defaults(),
        }
    }

    /// Replace the handler for one node kind.
    ///
    /// ```
    /// use markflow_engine::print::{MarkdownPrinter, Printer, handler};
    /// use markflow_engine::{Node, NodeType};
    ///
    /// let printer = MarkdownPrinter::default()
    ///     .with_handler(NodeType::ThematicBreak, handler(|_, _| "* * *".to_string()));
    /// assert_eq!(printer.print(&Node::root(vec![Node::thematic_break()])), "* * *\n");
    /// ```
    pub fn with_handler(mut self, kind: NodeType, handler: Handler) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub(crate) fn handler(&self, kind: NodeType) -> Option<&Handler> {
        self.handlers.get(&kind)
    }
}

impl Printer for MarkdownPrinter {
    fn print(&self, tree: &Node) -> String {
        let mut state = State::new(self);
        let mut out = state.handle(tree);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::options::{Bullet, Delimiter, EmphasisMarker, Fence, Rule};
    use super::*;
    use crate::scan::scan;
    use pretty_assertions::assert_eq;

    fn print(tree: &Node) -> String {
        MarkdownPrinter::default().print(tree)
    }

    fn alternative() -> FormatOptions {
        FormatOptions {
            bullet: Bullet::Plus,
            bullet_other: Bullet::Dash,
            ordered_delimiter: Delimiter::Paren,
            emphasis: EmphasisMarker::Underscore,
            strong: EmphasisMarker::Underscore,
            fence: Fence::Tilde,
            rule: Rule::Star,
            break_style: options::BreakStyle::Spaces,
            increment_list_marker: false,
        }
    }

    const DOCUMENT: &str = "# Heading with *emphasis* and `code`

A paragraph with **strong**, _under_, a [link](https://example.com \"Title\")
and an ![image](img.png) plus an escaped \\* star.
Hard break follows\\
next line.

- one
- two
  - nested
- three

1. first

2. second

* star list

> quoted
> > nested quote

```rust
fn main() {}
```

---
";

    #[test]
    fn prints_heading_and_paragraph() {
        let tree = Node::root(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::text("Body "),
                Node::emphasis(vec![Node::text("text")]),
                Node::text("."),
            ]),
        ]);
        assert_eq!(print(&tree), "# Title\n\nBody *text*.\n");
    }

    #[test]
    fn empty_root_prints_nothing() {
        assert_eq!(print(&Node::root(Vec::new())), "");
    }

    #[test]
    fn round_trips_with_any_options() {
        let tree = scan(DOCUMENT);
        for options in [FormatOptions::default(), alternative()] {
            let printed = MarkdownPrinter::new(options.clone()).print(&tree);
            let reparsed = scan(&printed);
            assert!(
                reparsed.same_structure(&tree),
                "options {options:?} printed:\n{printed}"
            );
        }
    }

    #[test]
    fn alternative_options_change_only_markers() {
        let tree = Node::root(vec![
            Node::paragraph(vec![
                Node::strong(vec![Node::text("a")]),
                Node::text(" "),
                Node::emphasis(vec![Node::text("b")]),
                Node::text(" c"),
                Node::hard_break(),
                Node::text("d"),
            ]),
            Node::list(true, Some(7), vec![
                Node::list_item(vec![Node::paragraph(vec![Node::text("x")])]),
                Node::list_item(vec![Node::paragraph(vec![Node::text("y")])]),
            ]),
            Node::code_block(Some("sh".into()), None, "ls"),
            Node::thematic_break(),
        ]);
        assert_eq!(
            MarkdownPrinter::new(alternative()).print(&tree),
            "__a__ _b_ c  \nd\n\n7) x\n7) y\n\n~~~sh\nls\n~~~\n\n***\n"
        );
    }

    #[test]
    fn nested_containers_indent() {
        let tree = Node::root(vec![Node::block_quote(vec![Node {
            kind: crate::tree::NodeKind::List {
                ordered: true,
                start: Some(3),
                spread: true,
            },
            ..Node::list(true, Some(3), vec![
                Node::list_item(vec![
                    Node::paragraph(vec![Node::text("one")]),
                    Node::code_block(Some("rust".into()), None, "let x = 1;"),
                ]),
                Node::list_item(vec![Node::paragraph(vec![Node::text("two")])]),
            ])
        }])]);

        insta::assert_snapshot!(print(&tree), @r"
        > 3. one
        >
        >    ```rust
        >    let x = 1;
        >    ```
        >
        > 4. two
        ");
    }

    #[test]
    fn adjacent_lists_alternate_markers() {
        let item = |t: &str| Node::list_item(vec![Node::paragraph(vec![Node::text(t)])]);
        let tree = Node::root(vec![
            Node::list(false, None, vec![item("a")]),
            Node::list(false, None, vec![item("b")]),
            Node::list(false, None, vec![item("c")]),
            Node::list(true, Some(1), vec![item("d")]),
            Node::list(true, Some(1), vec![item("e")]),
        ]);
        let printed = print(&tree);
        assert_eq!(printed, "- a\n\n* b\n\n- c\n\n1. d\n\n1) e\n");
        assert!(scan(&printed).same_structure(&tree));
    }

    #[test]
    fn thematic_break_avoids_the_bullet() {
        let tree = Node::root(vec![Node::list(false, None, vec![Node::list_item(vec![
            Node::thematic_break(),
        ])])]);
        let printed = print(&tree);
        assert_eq!(printed, "- ___\n");
        assert!(scan(&printed).same_structure(&tree));
    }

    #[test]
    fn text_that_looks_like_markup_is_escaped() {
        let tree = Node::root(vec![Node::paragraph(vec![Node::text(
            "# not a heading\n1. nor a list *x* [y]",
        )])]);
        let printed = print(&tree);
        assert_eq!(printed, "\\# not a heading\n1\\. nor a list \\*x\\* \\[y\\]\n");
        assert!(scan(&printed).same_structure(&tree));
    }

    #[test]
    fn emphasis_marker_switches_when_touching() {
        let nested = Node::root(vec![Node::paragraph(vec![Node::emphasis(vec![
            Node::strong(vec![Node::text("a")]),
        ])])]);
        assert_eq!(print(&nested), "*__a__*\n");
        assert!(scan(&print(&nested)).same_structure(&nested));

        let underscore = FormatOptions {
            emphasis: EmphasisMarker::Underscore,
            ..FormatOptions::default()
        };
        let intraword = Node::root(vec![Node::paragraph(vec![
            Node::text("a"),
            Node::emphasis(vec![Node::text("b")]),
        ])]);
        assert_eq!(MarkdownPrinter::new(underscore).print(&intraword), "a*b*\n");
    }

    #[test]
    fn code_fences_outgrow_their_content() {
        let tree = Node::root(vec![
            Node::code_block(None, None, "```\nx"),
            Node::paragraph(vec![Node::inline_code("a ` b")]),
            Node::paragraph(vec![Node::inline_code("`tick")]),
        ]);
        let printed = print(&tree);
        assert_eq!(printed, "````\n```\nx\n````\n\n``a ` b``\n\n`` `tick ``\n");
        assert!(scan(&printed).same_structure(&tree));
    }

    #[test]
    fn links_use_angle_destinations_when_needed() {
        let tree = Node::root(vec![Node::paragraph(vec![
            Node::text("Wow!"),
            Node::link("a b", Some("say \"hi\"".into()), vec![Node::text("x")]),
            Node::text(" "),
            Node::image("", None, "alt *"),
        ])]);
        let printed = print(&tree);
        assert_eq!(printed, "Wow\\![x](<a b> \"say \\\"hi\\\"\") ![alt \\*](<>)\n");
        assert!(scan(&printed).same_structure(&tree));
    }

    #[test]
    fn breaks_in_headings_become_spaces() {
        let tree = Node::root(vec![Node::heading(2, vec![
            Node::text("a"),
            Node::hard_break(),
            Node::text("b\nc"),
        ])]);
        assert_eq!(print(&tree), "## a b c\n");
    }

    /// Printed with `options`, scans back to `tree`.
    fn assert_round_trip(tree: &Node, options: FormatOptions) -> String {
        let printed = MarkdownPrinter::new(options.clone()).print(tree);
        let reparsed = scan(&printed);
        assert!(
            reparsed.same_structure(tree),
            "options {options:?} printed:\n{printed}"
        );
        printed
    }

    #[test]
    fn info_never_lengthens_the_fence() {
        let tilde_info = scan("```~~~\"");
        assert_eq!(
            assert_round_trip(&tilde_info, alternative()),
            "```~~~\"\n\n```\n"
        );
        assert_round_trip(&tilde_info, FormatOptions::default());

        let backtick_info = Node::root(vec![Node::code_block(Some("`js".into()), None, "x")]);
        assert_eq!(
            assert_round_trip(&backtick_info, FormatOptions::default()),
            "~~~`js\nx\n~~~\n"
        );

        // Neither fence fits as is
        let both = Node::root(vec![Node::code_block(Some("~`".into()), None, "x")]);
        assert_eq!(
            assert_round_trip(&both, FormatOptions::default()),
            "~~~\\~`\nx\n~~~\n"
        );
        assert_round_trip(&both, alternative());
    }

    #[test]
    fn nested_empty_items_do_not_print_as_rules() {
        for source in ["* - *\n", "- * -\n", "+ * +\n"] {
            let tree = scan(source);
            let printed = assert_round_trip(&tree, FormatOptions::default());
            assert!(!scan(&printed).children[0].is(NodeType::ThematicBreak));
            assert_round_trip(&tree, alternative());
        }
        assert_eq!(print(&scan("* - *")), "- * -\n");
    }

    #[test]
    fn space_style_breaks_fall_back_to_backslash() {
        let after_space = scan("a \\\nb\n");
        assert_eq!(assert_round_trip(&after_space, alternative()), "a \\\nb\n");

        let leading = scan("\\\nb\n");
        assert!(leading.children[0].children[0].is(NodeType::Break));
        assert_eq!(assert_round_trip(&leading, alternative()), "\\\nb\n");

        let plain = scan("a\\\nb\n");
        assert_eq!(assert_round_trip(&plain, alternative()), "a  \nb\n");
    }

    #[test]
    fn trailing_break_prints_nothing() {
        let tree = Node::root(vec![Node::paragraph(vec![
            Node::text("a"),
            Node::hard_break(),
            Node::text(" "),
        ])]);
        assert_eq!(print(&tree), "a\n");
        assert_eq!(MarkdownPrinter::new(alternative()).print(&tree), "a\n");
    }

    #[test]
    fn emphasis_keeps_edge_spaces_outside() {
        let tree = Node::root(vec![Node::paragraph(vec![
            Node::text("a"),
            Node::emphasis(vec![Node::text(" x ")]),
            Node::strong(vec![Node::text("y ")]),
            Node::text("b"),
        ])]);
        let default = print(&tree);
        let alternative = MarkdownPrinter::new(alternative()).print(&tree);
        assert_eq!(default, "a *x* **y** b\n");
        // `_` would touch the following letter
        assert_eq!(alternative, "a *x* **y** b\n");
        assert!(scan(&default).same_structure(&scan(&alternative)));

        let alone = Node::root(vec![Node::paragraph(vec![Node::emphasis(vec![Node::text(
            " x ",
        )])])]);
        assert_eq!(print(&alone), "*x*\n");
        assert!(scan("*x*").same_structure(&scan(&print(&alone))));
    }

    #[test]
    fn text_whitespace_is_normalized() {
        let tree = Node::root(vec![
            Node::paragraph(vec![Node::text(" lead")]),
            Node::paragraph(vec![Node::text("a \n\n  b")]),
            Node::paragraph(vec![Node::text("   # x")]),
            Node::heading(1, vec![Node::emphasis(vec![Node::text("c\nd")])]),
        ]);
        let printed = print(&tree);
        assert_eq!(printed, "lead\n\na\nb\n\n\\# x\n\n# *c d*\n");

        let reparsed = scan(&printed);
        assert_eq!(reparsed.children.len(), 4);
        assert!(reparsed.same_structure(&scan(
            &MarkdownPrinter::new(alternative()).print(&tree)
        )));
    }

    #[test]
    fn empty_items_print_bare_markers() {
        let tree = Node::root(vec![Node::list(false, None, vec![
            Node::list_item(Vec::new()),
            Node::list_item(vec![Node::paragraph(vec![Node::text("b")])]),
        ])]);
        assert_eq!(print(&tree), "-\n- b\n");
    }
}
