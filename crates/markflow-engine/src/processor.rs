//! # Processor
//!
//! Wires a [`Scanner`], an ordered list of plugins and a [`Printer`] into
//! one pipeline:
//!
//! ```text
//! text ──scan──▶ tree ──plugin 1──▶ … ──plugin n──▶ tree ──print──▶ text
//! ```
//!
//! A processor is a value. [`Processor::use_plugin`] returns a new processor
//! and leaves the receiver alone, so a base configuration can be shared and
//! extended. [`Processor::freeze`] attaches every plugin once; a frozen
//! processor accepts no more plugins and can serve any number of concurrent
//! runs, since each run owns its own [`VFile`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::cancel::{CANCELLED_RULE, CancelSignal, PIPELINE_SOURCE};
use crate::error::{ConfigurationError, ProcessError};
use crate::plugin::{Outcome, Plugin, PluginOptions, Transform, TransformError, Transformed};
use crate::print::{MarkdownPrinter, Printer};
use crate::scan::{LineIndex, MarkdownScanner, Scanner};
use crate::tree::Node;
use crate::vfile::{Message, Severity, VFile};

#[derive(Clone)]
struct Registration {
    plugin: Arc<dyn Plugin>,
    options: PluginOptions,
}

struct Attached {
    name: String,
    transform: Box<dyn Transform>,
}

#[derive(Clone)]
pub struct Processor {
    scanner: Arc<dyn Scanner>,
    printer: Arc<dyn Printer>,
    registrations: Arc<[Registration]>,
    attached: Option<Arc<[Attached]>>,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("plugins", &self.plugins())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

/// How a run through the plugins ended.
enum Settled {
    Done(VFile),
    Cancelled(VFile),
}

impl Processor {
    /// A processor with the default scanner and printer and no plugins.
    pub fn new() -> Self {
        Self {
            scanner: Arc::new(MarkdownScanner),
            printer: Arc::new(MarkdownPrinter::default()),
            registrations: Arc::from(Vec::new()),
            attached: None,
        }
    }

    pub fn with_scanner(mut self, scanner: impl Scanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    pub fn with_printer(mut self, printer: impl Printer + 'static) -> Self {
        self.printer = Arc::new(printer);
        self
    }

    /// A new processor running `plugin` after the ones already registered.
    pub fn use_plugin(&self, plugin: impl Plugin + 'static) -> Result<Processor, ConfigurationError> {
        self.use_plugin_with(plugin, PluginOptions::default())
    }

    pub fn use_plugin_with(
        &self,
        plugin: impl Plugin + 'static,
        options: impl Into<PluginOptions>,
    ) -> Result<Processor, ConfigurationError> {
        self.use_shared_plugin(Arc::new(plugin), options.into())
    }

    /// Register a plugin that is already behind an `Arc`, such as one
    /// resolved from the [built-in registry](crate::builtin::registry).
    pub fn use_shared_plugin(
        &self,
        plugin: Arc<dyn Plugin>,
        options: PluginOptions,
    ) -> Result<Processor, ConfigurationError> {
        if self.is_frozen() {
            return Err(ConfigurationError::Frozen {
                plugin: plugin.name().to_string(),
            });
        }
        debug!("Registering plugin {} {}", plugin.name(), plugin.version());

        let mut registrations = self.registrations.to_vec();
        registrations.push(Registration { plugin, options });
        Ok(Processor {
            registrations: registrations.into(),
            ..self.clone()
        })
    }

    /// Attach every plugin, in registration order.
    ///
    /// Freezing a frozen processor returns a copy of it.
    pub fn freeze(&self) -> Result<Processor, ConfigurationError> {
        if self.is_frozen() {
            return Ok(self.clone());
        }

        let attached = self
            .registrations
            .iter()
            .map(|registration| -> Result<Attached, ConfigurationError> {
                let name = registration.plugin.name().to_string();
                let transform = registration
                    .plugin
                    .attach(&registration.options)
                    .map_err(|source| {
                        warn!("Plugin {name} failed to attach: {source:#}");
                        ConfigurationError::Attach {
                            plugin: name.clone(),
                            source,
                        }
                    })?;
                Ok(Attached { name, transform })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Froze processor with {} plugins", attached.len());
        Ok(Processor {
            attached: Some(attached.into()),
            ..self.clone()
        })
    }

    pub fn is_frozen(&self) -> bool {
        self.attached.is_some()
    }

    /// Registered plugin names, in the order they run.
    pub fn plugins(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|registration| registration.plugin.name())
            .collect()
    }

    /// Scan `text` into a file with its tree attached. No plugins run.
    pub fn parse(&self, text: impl Into<String>) -> Result<VFile, ProcessError> {
        self.parse_file(VFile::new(text))
    }

    /// [`parse`](Self::parse) a prepared file, keeping its path and data.
    pub fn parse_file(&self, mut file: VFile) -> Result<VFile, ProcessError> {
        match self.scanner.scan(&mut file) {
            Ok(tree) => {
                file.set_tree(tree);
                Ok(file)
            }
            Err(fatal) => {
                warn!("Scanning failed: {}", fatal.message.reason);
                Err(ProcessError::Fatal {
                    message: fatal.message,
                    file: Box::new(file),
                })
            }
        }
    }

    /// Run the plugins over `tree` synchronously. The resulting tree is
    /// attached to the returned file.
    pub fn run_sync(&self, tree: Node, file: VFile) -> Result<VFile, ProcessError> {
        let frozen = self.frozen()?;
        frozen.run_stages_sync(tree, file)
    }

    /// Print a tree with this processor's printer.
    pub fn stringify(&self, tree: &Node) -> String {
        self.printer.print(tree)
    }

    /// Scan, transform and print `text`.
    pub async fn process(&self, text: impl Into<String>) -> Result<VFile, ProcessError> {
        self.process_with_cancel(text, CancelSignal::never()).await
    }

    /// [`process`](Self::process) a prepared file. Its path and data are
    /// carried through to the result.
    pub async fn process_file(&self, file: VFile) -> Result<VFile, ProcessError> {
        self.process_file_with_cancel(file, CancelSignal::never())
            .await
    }

    /// [`process`](Self::process), stopping at the next stage boundary once
    /// `cancel` is raised.
    ///
    /// A cancelled run is not an error: the returned file keeps its source
    /// text and the tree of the last completed stage, and carries an info
    /// message with rule id `cancelled`.
    pub async fn process_with_cancel(
        &self,
        text: impl Into<String>,
        cancel: CancelSignal,
    ) -> Result<VFile, ProcessError> {
        self.process_file_with_cancel(VFile::new(text), cancel)
            .await
    }

    pub async fn process_file_with_cancel(
        &self,
        file: VFile,
        cancel: CancelSignal,
    ) -> Result<VFile, ProcessError> {
        let frozen = self.frozen()?;
        let (tree, file) = frozen.scan(file)?;

        match frozen.run_stages(tree, file, &cancel).await? {
            Settled::Cancelled(file) => Ok(file),
            Settled::Done(mut file) => {
                if cancel.is_cancelled() {
                    mark_cancelled(&mut file, "printing");
                } else {
                    frozen.print_into(&mut file);
                }
                Ok(file)
            }
        }
    }

    /// Scan, transform and print `text` without an executor.
    ///
    /// Fails with [`ProcessError::Synchrony`] as soon as a plugin returns a
    /// pending result; nothing is printed then.
    pub fn process_sync(&self, text: impl Into<String>) -> Result<VFile, ProcessError> {
        self.process_file_sync(VFile::new(text))
    }

    pub fn process_file_sync(&self, file: VFile) -> Result<VFile, ProcessError> {
        let frozen = self.frozen()?;
        let (tree, file) = frozen.scan(file)?;
        let mut file = frozen.run_stages_sync(tree, file)?;
        frozen.print_into(&mut file);
        Ok(file)
    }

    /// [`process_sync`](Self::process_sync) for raw bytes, which must be UTF-8.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<VFile, ProcessError> {
        self.decode(bytes, None)
    }

    /// [`process_bytes`](Self::process_bytes) for input read from `path`,
    /// which labels the resulting file and its messages.
    pub fn process_bytes_from(
        &self,
        path: impl Into<String>,
        bytes: &[u8],
    ) -> Result<VFile, ProcessError> {
        self.decode(bytes, Some(path.into()))
    }

    fn decode(&self, bytes: &[u8], path: Option<String>) -> Result<VFile, ProcessError> {
        let label = |file: VFile| match &path {
            Some(path) => file.with_path(path.clone()),
            None => file,
        };
        match std::str::from_utf8(bytes) {
            Ok(text) => self.process_file_sync(label(VFile::new(text))),
            Err(error) => {
                let mut file = label(VFile::new(String::from_utf8_lossy(bytes).into_owned()));
                let offset = error.valid_up_to();
                let position = LineIndex::new(file.text())
                    .position(offset..offset + char::REPLACEMENT_CHARACTER.len_utf8());
                let fatal = file.fail(
                    format!("Input is not valid UTF-8 after byte {offset}"),
                    Some(position),
                );
                warn!("{}", fatal.message.reason);
                Err(ProcessError::Fatal {
                    message: fatal.message,
                    file: Box::new(file),
                })
            }
        }
    }

    /// This processor if it is frozen, or a frozen copy.
    fn frozen(&self) -> Result<Cow<'_, Processor>, ConfigurationError> {
        if self.is_frozen() {
            Ok(Cow::Borrowed(self))
        } else {
            self.freeze().map(Cow::Owned)
        }
    }

    fn stages(&self) -> &[Attached] {
        self.attached.as_deref().unwrap_or_default()
    }

    fn scan(&self, file: VFile) -> Result<(Node, VFile), ProcessError> {
        let mut file = self.parse_file(file)?;
        debug!(
            "Processing {} bytes through {} plugins",
            file.text().len(),
            self.stages().len()
        );
        let tree = file.take_tree().unwrap_or_else(|| Node::root(Vec::new()));
        Ok((tree, file))
    }

    fn print_into(&self, file: &mut VFile) {
        let text = file
            .tree()
            .map(|tree| self.printer.print(tree))
            .unwrap_or_default();
        file.set_text(text);
    }

    async fn run_stages(
        &self,
        mut tree: Node,
        mut file: VFile,
        cancel: &CancelSignal,
    ) -> Result<Settled, ProcessError> {
        for stage in self.stages() {
            if cancel.is_cancelled() {
                file.set_tree(tree);
                mark_cancelled(&mut file, &stage.name);
                return Ok(Settled::Cancelled(file));
            }

            debug!("Running plugin {}", stage.name);
            let result = match stage.transform.transform(&mut tree, &mut file) {
                Transformed::Ready(result) => result,
                Transformed::Pending(future) => future.await,
            };
            match result {
                Ok(Outcome::Keep) => {}
                Ok(Outcome::Replace(replacement)) => tree = replacement,
                Err(error) => return Err(stage_error(&stage.name, error, tree, file)),
            }
        }

        file.set_tree(tree);
        Ok(Settled::Done(file))
    }

    fn run_stages_sync(&self, mut tree: Node, mut file: VFile) -> Result<VFile, ProcessError> {
        for stage in self.stages() {
            debug!("Running plugin {}", stage.name);
            // The pending future is dropped with the temporary, releasing the tree
            let result = match stage.transform.transform(&mut tree, &mut file) {
                Transformed::Ready(result) => Some(result),
                Transformed::Pending(_) => None,
            };
            let Some(result) = result else {
                warn!("Plugin {} returned a pending result in a synchronous run", stage.name);
                file.set_tree(tree);
                return Err(ProcessError::Synchrony {
                    plugin: stage.name.clone(),
                    file: Box::new(file),
                });
            };

            match result {
                Ok(Outcome::Keep) => {}
                Ok(Outcome::Replace(replacement)) => tree = replacement,
                Err(error) => return Err(stage_error(&stage.name, error, tree, file)),
            }
        }

        file.set_tree(tree);
        Ok(file)
    }
}

/// Turn a failed transform into an error carrying the file and the tree as
/// the transform left it.
fn stage_error(plugin: &str, error: TransformError, tree: Node, mut file: VFile) -> ProcessError {
    file.set_tree(tree);
    match error {
        TransformError::Fatal(fatal) => {
            warn!("Plugin {plugin} stopped the run: {}", fatal.message.reason);
            ProcessError::Fatal {
                message: fatal.message,
                file: Box::new(file),
            }
        }
        TransformError::Plugin(source) => {
            warn!("Plugin {plugin} failed: {source:#}");
            ProcessError::Plugin {
                plugin: plugin.to_string(),
                source,
                file: Box::new(file),
            }
        }
    }
}

fn mark_cancelled(file: &mut VFile, before: &str) {
    debug!("Run cancelled before {before}");
    file.push(
        Message::new(format!("Processing was cancelled before {before}"), Severity::Info)
            .with_rule(CANCELLED_RULE)
            .with_source(PIPELINE_SOURCE),
    );
}
