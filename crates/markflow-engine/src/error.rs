//! Errors surfaced by the [`Processor`](crate::Processor).
//!
//! Every error raised while a document is being processed carries the
//! [`VFile`] as it stood when the run stopped, so callers can still report
//! the diagnostics gathered up to that point.

use crate::vfile::{Message, VFile};

/// A processor was used in a way its current state does not allow.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("cannot add plugin `{plugin}`: the processor is frozen")]
    Frozen { plugin: String },
    #[error("plugin `{plugin}` failed to attach: {source}")]
    Attach {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A pipeline run that did not produce output.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// A transform returned a pending result inside a synchronous run.
    #[error("plugin `{plugin}` cannot run synchronously: it returned a pending result")]
    Synchrony { plugin: String, file: Box<VFile> },
    /// A stage called [`VFile::fail`].
    #[error("{}", .message.reason)]
    Fatal { message: Message, file: Box<VFile> },
    /// A transform returned an error of its own.
    #[error("plugin `{plugin}` failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: anyhow::Error,
        file: Box<VFile>,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl ProcessError {
    /// Whether this is an expected termination raised through [`VFile::fail`].
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// The partial file, for every error raised during a run.
    pub fn file(&self) -> Option<&VFile> {
        match self {
            Self::Synchrony { file, .. } | Self::Fatal { file, .. } | Self::Plugin { file, .. } => {
                Some(file)
            }
            Self::Configuration(_) => None,
        }
    }

    pub fn into_file(self) -> Option<VFile> {
        match self {
            Self::Synchrony { file, .. } | Self::Fatal { file, .. } | Self::Plugin { file, .. } => {
                Some(*file)
            }
            Self::Configuration(_) => None,
        }
    }
}
