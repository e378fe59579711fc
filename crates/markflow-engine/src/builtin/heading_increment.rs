//! `heading-increment`: warn when a heading skips a level, e.g. `#` then `###`.

use crate::cancel::PIPELINE_SOURCE;
use crate::plugin::{Outcome, Plugin, PluginOptions, Transform, Transformed};
use crate::tree::{Action, Node, NodeKind, NodeType, is, visit};
use crate::vfile::{Message, Severity, VFile};

pub const NAME: &str = "heading-increment";

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingIncrement;

impl Plugin for HeadingIncrement {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn attach(&self, _options: &PluginOptions) -> anyhow::Result<Box<dyn Transform>> {
        Ok(Box::new(HeadingIncrement))
    }
}

impl Transform for HeadingIncrement {
    fn transform<'a>(&'a self, tree: &'a mut Node, file: &'a mut VFile) -> Transformed<'a> {
        let mut previous: Option<u8> = None;
        let mut warnings = Vec::new();
        visit(tree, is(NodeType::Heading), |heading, _| {
            if let NodeKind::Heading { depth } = heading.kind {
                if let Some(previous) = previous
                    && depth > previous + 1
                {
                    let reason = format!(
                        "Heading level {depth} follows level {previous}, expected at most {}",
                        previous + 1
                    );
                    warnings.push(
                        Message::new(reason, Severity::Warning)
                        .with_position(heading.position)
                        .with_rule(NAME)
                        .with_source(PIPELINE_SOURCE),
                    );
                }
                previous = Some(depth);
            }
            Action::Skip
        });

        for warning in warnings {
            file.push(warning);
        }
        Transformed::Ready(Ok(Outcome::Keep))
    }
}
