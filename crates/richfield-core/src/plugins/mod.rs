//! Built-in plugins. Each one owns its node specs, import matchers,
//! normalize passes and commands.

mod block;
mod collapsible;
mod core;
mod date;
mod embed;
mod format;
mod history;
mod image;
mod layout;
mod link;
mod list;
mod rule;
mod table;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CommandError;
use crate::plugin::EditorPlugin;

pub use link::PLACEHOLDER_URL;

pub(crate) fn core_plugins() -> Vec<Box<dyn EditorPlugin>> {
    vec![Box::new(core::CorePlugin), Box::new(history::HistoryPlugin)]
}

pub(crate) fn standard_plugins() -> Vec<Box<dyn EditorPlugin>> {
    let mut plugins = core_plugins();
    plugins.extend([
        Box::new(format::FormatPlugin) as Box<dyn EditorPlugin>,
        Box::new(block::BlockPlugin),
        Box::new(list::ListPlugin),
        Box::new(link::LinkPlugin),
        Box::new(image::ImagePlugin),
        Box::new(table::TablePlugin),
        Box::new(layout::LayoutPlugin),
        Box::new(embed::EmbedPlugin),
        Box::new(collapsible::CollapsiblePlugin),
        Box::new(date::DatePlugin),
        Box::new(rule::RulePlugin),
    ]);
    plugins
}

/// Deserializes a command payload. `null` yields the defaults.
pub(crate) fn args<T: DeserializeOwned + Default>(
    command: &str,
    payload: &Value,
) -> Result<T, CommandError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload.clone()).map_err(|err| {
        tracing::debug!(command, %err, "rejected command payload");
        CommandError::invalid_payload(command, err.to_string())
    })
}

/// Tags of elements that hold block content, used by matchers that need to
/// tell a wrapper `<div>` from a paragraph-like one.
pub(crate) const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "ul",
    "ol",
    "li",
    "table",
    "div",
    "details",
    "figure",
    "hr",
    "iframe",
    "pre",
];
