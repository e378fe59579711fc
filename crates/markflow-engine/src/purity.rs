//! Purity check for plugins.
//!
//! A frozen processor reuses one attached transform for every document, so a
//! transform that remembers anything between documents leaks it into the
//! next one. [`check_purity`] runs the same transform twice over deep copies
//! of one document and reports any difference in the resulting trees or
//! messages.

use futures::executor::block_on;

use crate::plugin::{Outcome, Plugin, PluginOptions, TransformError, Transformed};
use crate::scan::{MarkdownScanner, Scanner};
use crate::tree::Node;
use crate::vfile::{Fatal, VFile};

#[derive(Debug, thiserror::Error)]
pub enum PurityError {
    #[error("document could not be scanned: {0}")]
    Scan(#[from] Fatal),
    #[error("plugin `{plugin}` failed to attach: {source}")]
    Attach {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("plugin `{plugin}` failed: {source}")]
    Transform {
        plugin: String,
        #[source]
        source: TransformError,
    },
    #[error("plugin `{plugin}` produced different trees for the same document")]
    Tree { plugin: String },
    #[error("plugin `{plugin}` reported {first} messages on the first run and {second} on the second")]
    Messages {
        plugin: String,
        first: usize,
        second: usize,
    },
    #[error("plugin `{plugin}` reported different messages for the same document")]
    MessageContent { plugin: String },
}

/// Attach `plugin` once and run it twice over `text`.
///
/// Pending transforms are driven to completion on the current thread.
pub fn check_purity(
    plugin: &dyn Plugin,
    options: &PluginOptions,
    text: &str,
) -> Result<(), PurityError> {
    let name = plugin.name().to_string();
    let transform = plugin
        .attach(options)
        .map_err(|source| PurityError::Attach {
            plugin: name.clone(),
            source,
        })?;

    let mut file = VFile::new(text);
    let tree = MarkdownScanner.scan(&mut file)?;

    let run = || -> Result<(Node, VFile), PurityError> {
        let mut tree = tree.clone();
        let mut file = file.clone();
        let result = match transform.transform(&mut tree, &mut file) {
            Transformed::Ready(result) => result,
            Transformed::Pending(future) => block_on(future),
        };
        match result {
            Ok(Outcome::Keep) => Ok((tree, file)),
            Ok(Outcome::Replace(replacement)) => Ok((replacement, file)),
            Err(source) => Err(PurityError::Transform {
                plugin: name.clone(),
                source,
            }),
        }
    };

    let (first_tree, first_file) = run()?;
    let (second_tree, second_file) = run()?;

    if first_tree != second_tree {
        return Err(PurityError::Tree { plugin: name });
    }
    let (first, second) = (first_file.messages(), second_file.messages());
    if first.len() != second.len() {
        return Err(PurityError::Messages {
            plugin: name,
            first: first.len(),
            second: second.len(),
        });
    }
    if first != second {
        return Err(PurityError::MessageContent { plugin: name });
    }
    Ok(())
}
