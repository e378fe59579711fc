//! Plugins that ship with markflow, resolvable by name from configuration.

pub mod heading_ids;
pub mod heading_increment;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::plugin::Plugin;

pub use heading_ids::HeadingIds;
pub use heading_increment::HeadingIncrement;

/// Every built-in plugin, keyed by name.
pub fn registry() -> BTreeMap<&'static str, Arc<dyn Plugin>> {
    let plugins: [(&'static str, Arc<dyn Plugin>); 2] = [
        (heading_ids::NAME, Arc::new(HeadingIds)),
        (heading_increment::NAME, Arc::new(HeadingIncrement)),
    ];
    plugins.into_iter().collect()
}

/// Look up one built-in plugin.
pub fn find(name: &str) -> Option<Arc<dyn Plugin>> {
    registry().remove(name)
}
