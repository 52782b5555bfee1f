mod config;
mod core;
mod document;
mod error;
mod events;
mod export;
mod history;
mod import;
mod nodes;
mod normalize;
mod ops;
mod plugin;
mod plugins;
mod render;
mod selection;
mod serde_value;
mod table_geometry;
mod toolbar;
mod txn;
mod upload;

pub use crate::config::*;
pub use crate::core::*;
pub use crate::document::*;
pub use crate::error::*;
pub use crate::events::*;
pub use crate::export::*;
pub use crate::import::*;
pub use crate::nodes::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::plugins::PLACEHOLDER_URL;
pub use crate::render::{EmbedLoader, EmbedRequest, EmbedState, NoopEmbedLoader};
pub use crate::selection::*;
pub use crate::serde_value::*;
pub use crate::table_geometry::*;
pub use crate::toolbar::ToolbarState;
pub use crate::txn::Txn;
pub use crate::upload::*;

pub use richfield_html::{DomNode, Element, sanitize};
