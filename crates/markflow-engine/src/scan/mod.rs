//! # Scanner
//!
//! Turns the text of a [`VFile`] into a document tree.
//!
//! [`MarkdownScanner`] is the default: `markflow-syntax` builds a lossless
//! syntax tree, then [`lower`] reduces it to [`Node`]s with positions.
//! Malformed input never fails a scan. Whatever does not close is kept as
//! text and reported as a warning on the file.

mod line_index;
mod lower;

pub use line_index::LineIndex;

use log::trace;

use crate::cancel::PIPELINE_SOURCE;
use crate::tree::Node;
use crate::vfile::{Fatal, Message, Severity, VFile};

/// Text → tree stage of a [`Processor`](crate::Processor).
pub trait Scanner: Send + Sync {
    /// Scan the file's text. Recoverable problems become messages on `file`;
    /// an `Err` ends the run.
    fn scan(&self, file: &mut VFile) -> Result<Node, Fatal>;
}

/// The default scanner for the markflow Markdown dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownScanner;

impl Scanner for MarkdownScanner {
    fn scan(&self, file: &mut VFile) -> Result<Node, Fatal> {
        let (tree, warnings) = {
            let text = file.text();
            let parse = markflow_syntax::parse_with_errors(text);
            let index = LineIndex::new(text);
            let tree = lower::Lowerer::new(&index).root(&parse.syntax());

            let warnings: Vec<Message> = parse
                .errors()
                .iter()
                .map(|error| {
                    Message::new(error.message.clone(), Severity::Warning)
                        .with_position(Some(index.position(error.range.clone())))
                        .with_rule(error.rule)
                        .with_source(PIPELINE_SOURCE)
                })
                .collect();
            (tree, warnings)
        };

        trace!(
            "Scanned {} bytes into {} blocks with {} warnings",
            file.text().len(),
            tree.children.len(),
            warnings.len()
        );
        for warning in warnings {
            file.push(warning);
        }
        Ok(tree)
    }
}

/// Scan `text` with the default scanner, dropping diagnostics.
pub fn scan(text: &str) -> Node {
    let mut file = VFile::new(text);
    // The default scanner never fails
    MarkdownScanner
        .scan(&mut file)
        .unwrap_or_else(|_| Node::root(Vec::new()))
}
