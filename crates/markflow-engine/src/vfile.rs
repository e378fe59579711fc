//! # Diagnostics Container
//!
//! A [`VFile`] is the unit of work that flows through one pipeline run: the
//! text (source before scanning, output after printing), the tree once it
//! has been scanned, and every message raised along the way.
//!
//! Messages are append-only. Nothing in the pipeline removes or rewrites a
//! message once it has been recorded.

use std::fmt;

use crate::tree::{Data, Node, Position};

/// How serious a [`Message`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A diagnostic about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub reason: String,
    pub position: Option<Position>,
    /// Stable identifier of the check that raised this, e.g. `unclosed-link`
    pub rule_id: Option<String>,
    /// Who raised it: a plugin name, or `markflow` for the pipeline itself
    pub source: Option<String>,
    pub severity: Severity,
    /// Set on the message recorded by [`VFile::fail`]
    pub fatal: bool,
}

impl Message {
    pub fn new(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            reason: reason.into(),
            position: None,
            rule_id: None,
            source: None,
            severity,
            fatal: false,
        }
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Message {
    /// `line:column: severity: reason [source:rule]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: ", position.start)?,
            None => f.write_str("1:1: ")?,
        }
        write!(f, "{}: {}", self.severity, self.reason)?;
        match (&self.source, &self.rule_id) {
            (Some(source), Some(rule)) => write!(f, " [{source}:{rule}]"),
            (None, Some(rule)) => write!(f, " [{rule}]"),
            (Some(source), None) => write!(f, " [{source}]"),
            (None, None) => Ok(()),
        }
    }
}

/// An unrecoverable failure raised through [`VFile::fail`].
///
/// The matching message is already on the file; this value only carries the
/// failure up the call stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .message.reason)]
pub struct Fatal {
    pub message: Message,
}

/// A document and its diagnostics.
#[derive(Debug, Clone, Default)]
pub struct VFile {
    text: String,
    path: Option<String>,
    tree: Option<Node>,
    messages: Vec<Message>,
    /// Document-scoped sidecar, namespaced like [`Node::data`]
    pub data: Data,
}

impl VFile {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Label the file with where it came from. Only used for display.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn set_tree(&mut self, tree: Node) {
        self.tree = Some(tree);
    }

    pub(crate) fn take_tree(&mut self) -> Option<Node> {
        self.tree.take()
    }

    /// Record a message and return it.
    pub fn message(
        &mut self,
        reason: impl Into<String>,
        position: Option<Position>,
        rule_id: Option<&str>,
        severity: Severity,
    ) -> &Message {
        let mut message = Message::new(reason, severity).with_position(position);
        if let Some(rule_id) = rule_id {
            message = message.with_rule(rule_id);
        }
        self.push(message)
    }

    /// Record a fully built message and return it.
    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn info(&mut self, reason: impl Into<String>, position: Option<Position>) -> &Message {
        self.message(reason, position, None, Severity::Info)
    }

    pub fn warn(&mut self, reason: impl Into<String>, position: Option<Position>) -> &Message {
        self.message(reason, position, None, Severity::Warning)
    }

    pub fn error(&mut self, reason: impl Into<String>, position: Option<Position>) -> &Message {
        self.message(reason, position, None, Severity::Error)
    }

    /// Record a fatal error and return it for propagation.
    ///
    /// ```
    /// use markflow_engine::{Fatal, VFile};
    ///
    /// fn check(file: &mut VFile) -> Result<(), Fatal> {
    ///     Err(file.fail("cannot continue", None))
    /// }
    ///
    /// let mut file = VFile::new("");
    /// assert!(check(&mut file).is_err());
    /// assert!(file.messages()[0].fatal);
    /// ```
    pub fn fail(&mut self, reason: impl Into<String>, position: Option<Position>) -> Fatal {
        let mut message = Message::new(reason, Severity::Error).with_position(position);
        message.fatal = true;
        self.messages.push(message.clone());
        Fatal { message }
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity >= Severity::Warning)
    }

    /// Whether the run that produced this file was cancelled before printing.
    pub fn is_cancelled(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.rule_id.as_deref() == Some(crate::cancel::CANCELLED_RULE))
    }

    /// Every message on its own line, prefixed with the path when there is
    /// one: `notes/a.md:3:1: warning: ...`.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            if let Some(path) = &self.path {
                out.push_str(path);
                out.push(':');
            }
            out.push_str(&message.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for VFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
