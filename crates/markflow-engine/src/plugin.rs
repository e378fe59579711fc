//! # Plugin Contract
//!
//! A [`Plugin`] is a factory: the processor hands it its options once, when
//! the processor is frozen, and gets back a [`Transform`]. The transform is
//! what runs for every document.
//!
//! ## Purity
//!
//! A frozen processor is shared between concurrent runs, so a transform must
//! not keep state from one document to the next. Everything it learns about a
//! document belongs in that document's tree, messages or [`VFile::data`].
//! This is not enforced; [`crate::purity::check_purity`] can test for it.
//!
//! ## Results
//!
//! A transform either edits the tree it is given in place and returns
//! [`Outcome::Keep`], or builds a new one and returns
//! [`Outcome::Replace`]. Work that has to wait returns
//! [`Transformed::Pending`]; such a plugin only runs through
//! [`Processor::process`](crate::Processor::process).

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::tree::Node;
use crate::vfile::{Fatal, VFile};

/// Options given to a plugin when it is attached.
///
/// A JSON value, usually an object; `null` when none were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginOptions(Value);

impl PluginOptions {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize into the plugin's own options type; no options at all
    /// gives its default.
    pub fn parse<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        if self.0.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(self.0.clone())?)
    }
}

impl From<Value> for PluginOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Plugin factory, registered on a [`Processor`](crate::Processor).
pub trait Plugin: Send + Sync {
    /// Unique name; also the namespace of the plugin's data keys.
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Build the transform for the given options.
    fn attach(&self, options: &PluginOptions) -> anyhow::Result<Box<dyn Transform>>;
}

/// One attached plugin, applied to every document.
///
/// A frozen processor shares one transform between all of its runs, which
/// may be concurrent. A transform must not keep state from one document to
/// the next; per-run state belongs in locals or in the [`VFile`].
/// [`check_purity`](crate::purity::check_purity) tests for this.
pub trait Transform: Send + Sync {
    fn transform<'a>(&'a self, tree: &'a mut Node, file: &'a mut VFile) -> Transformed<'a>;
}

/// What a transform did with the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The tree was left as it is or edited in place
    Keep,
    /// The tree is replaced wholesale
    Replace(Node),
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Raised through [`VFile::fail`]
    #[error(transparent)]
    Fatal(#[from] Fatal),
    #[error(transparent)]
    Plugin(#[from] anyhow::Error),
}

pub type TransformResult = Result<Outcome, TransformError>;

/// Result of [`Transform::transform`]: settled now, or later.
pub enum Transformed<'a> {
    Ready(TransformResult),
    Pending(BoxFuture<'a, TransformResult>),
}

impl<'a> Transformed<'a> {
    pub fn keep() -> Self {
        Self::Ready(Ok(Outcome::Keep))
    }

    pub fn replace(tree: Node) -> Self {
        Self::Ready(Ok(Outcome::Replace(tree)))
    }

    pub fn error(error: impl Into<TransformError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    pub fn pending(future: impl Future<Output = TransformResult> + Send + 'a) -> Self {
        Self::Pending(future.boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<TransformResult> for Transformed<'_> {
    fn from(result: TransformResult) -> Self {
        Self::Ready(result)
    }
}

/// A synchronous plugin made from a function, with no options.
///
/// ```
/// use markflow_engine::{Node, Outcome, Processor, plugin};
///
/// let append = plugin::from_fn("append-rule", |tree, _file| {
///     tree.children.push(Node::thematic_break());
///     Ok(Outcome::Keep)
/// });
/// let processor = Processor::new().use_plugin(append).unwrap();
/// let file = processor.process_sync("# T").unwrap();
/// assert_eq!(file.text(), "# T\n\n---\n");
/// ```
pub fn from_fn<F>(name: &str, f: F) -> FnPlugin<F>
where
    F: Fn(&mut Node, &mut VFile) -> TransformResult + Send + Sync + 'static,
{
    FnPlugin {
        name: name.to_string(),
        f: Arc::new(f),
    }
}

pub struct FnPlugin<F> {
    name: String,
    f: Arc<F>,
}

struct FnTransform<F> {
    f: Arc<F>,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut Node, &mut VFile) -> TransformResult + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&self, _options: &PluginOptions) -> anyhow::Result<Box<dyn Transform>> {
        Ok(Box::new(FnTransform {
            f: Arc::clone(&self.f),
        }))
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&mut Node, &mut VFile) -> TransformResult + Send + Sync + 'static,
{
    fn transform<'a>(&'a self, tree: &'a mut Node, file: &'a mut VFile) -> Transformed<'a> {
        Transformed::Ready((self.f)(tree, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Options {
        #[serde(default)]
        prefix: String,
    }

    #[test]
    fn options_parse_with_default() {
        let none = PluginOptions::default();
        assert_eq!(none.parse::<Options>().unwrap(), Options::default());

        let some = PluginOptions::new(serde_json::json!({ "prefix": "x-" }));
        assert_eq!(some.parse::<Options>().unwrap().prefix, "x-");
        assert_eq!(some.get("prefix"), Some(&Value::from("x-")));

        let wrong = PluginOptions::new(serde_json::json!({ "prefix": 3 }));
        assert!(wrong.parse::<Options>().is_err());
    }

    #[test]
    fn fn_plugin_attaches_and_runs() {
        let plugin = from_fn("count", |tree, file| {
            file.info(format!("{} children", tree.children.len()), None);
            Ok(Outcome::Keep)
        });
        assert_eq!(plugin.name(), "count");

        let transform = plugin.attach(&PluginOptions::default()).unwrap();
        let mut tree = Node::root(vec![Node::thematic_break()]);
        let mut file = VFile::new("");
        let Transformed::Ready(result) = transform.transform(&mut tree, &mut file) else {
            panic!("function plugins are synchronous");
        };
        assert_eq!(result.unwrap(), Outcome::Keep);
        assert_eq!(file.messages()[0].reason, "1 children");
    }
}
