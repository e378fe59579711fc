//! # markflow engine
//!
//! Markdown in, tree through a chain of plugins, Markdown out.
//!
//! ```
//! use markflow_engine::{Node, Outcome, Processor, plugin};
//!
//! let shout = plugin::from_fn("shout", |tree, _file| {
//!     markflow_engine::tree::visit_mut(tree, markflow_engine::tree::any, |node, _| {
//!         if let Some(value) = &mut node.value {
//!             *value = value.to_uppercase();
//!         }
//!         markflow_engine::tree::Action::Continue
//!     });
//!     Ok(Outcome::Keep)
//! });
//!
//! let processor = Processor::new().use_plugin(shout)?.freeze()?;
//! let file = processor.process_sync("# Hello *world*")?;
//! assert_eq!(file.text(), "# HELLO *WORLD*\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builtin;
pub mod cancel;
pub mod error;
pub mod plugin;
pub mod print;
pub mod processor;
pub mod purity;
pub mod scan;
pub mod tree;
pub mod vfile;

// Re-export key types for easier usage
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use error::{ConfigurationError, ProcessError};
pub use plugin::{Outcome, Plugin, PluginOptions, Transform, Transformed};
pub use print::{FormatOptions, MarkdownPrinter, Printer};
pub use processor::Processor;
pub use scan::{MarkdownScanner, Scanner};
pub use tree::{Data, DataKey, Node, NodeKind, NodeType, Point, Position};
pub use vfile::{Fatal, Message, Severity, VFile};
