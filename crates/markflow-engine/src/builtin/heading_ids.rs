//! `heading-ids`: give every heading a GitHub-style anchor id.
//!
//! The id lands in the heading's sidecar under `heading-ids:id`; it is never
//! printed. Repeated slugs get `-1`, `-2`, … appended in document order.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::plugin::{Outcome, Plugin, PluginOptions, Transform, Transformed};
use crate::tree::{Action, DataKey, Node, NodeType, is, visit_mut};
use crate::vfile::VFile;

pub const NAME: &str = "heading-ids";

/// Sidecar key holding a heading's id.
pub fn id_key() -> DataKey {
    DataKey::new(NAME, "id")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    /// Prepended to every id
    prefix: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingIds;

impl Plugin for HeadingIds {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn attach(&self, options: &PluginOptions) -> anyhow::Result<Box<dyn Transform>> {
        let options: Options = options.parse()?;
        Ok(Box::new(HeadingIdsTransform {
            prefix: options.prefix,
        }))
    }
}

struct HeadingIdsTransform {
    prefix: String,
}

impl Transform for HeadingIdsTransform {
    fn transform<'a>(&'a self, tree: &'a mut Node, _file: &'a mut VFile) -> Transformed<'a> {
        // Seen slugs belong to this document only
        let mut slugger = Slugger::default();
        visit_mut(tree, is(NodeType::Heading), |heading, _| {
            let id = format!("{}{}", self.prefix, slugger.slug(&heading.text_content()));
            heading.data.insert(id_key(), id);
            Action::Skip
        });
        Transformed::Ready(Ok(Outcome::Keep))
    }
}

/// Lowercase, drop punctuation, turn spaces into dashes.
pub fn slugify(text: &str) -> String {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    let punctuation =
        PUNCTUATION.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\p{M}\s_-]").expect("Invalid slug regex"));

    punctuation
        .replace_all(&text.trim().to_lowercase(), "")
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Hands out unique slugs.
#[derive(Debug, Default)]
struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}
