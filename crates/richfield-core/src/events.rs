use serde::Serialize;

use crate::document::NodeKey;

/// Notifications for the host, which owns any popover or dialog UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EditorEvent {
    LinkClicked {
        key: NodeKey,
        url: String,
        /// `url` resolved against the site base url.
        href: String,
    },
    LinkCreated {
        key: NodeKey,
        url: String,
        placeholder: bool,
    },
    CloseLinkEditorDialog,
}

/// Emitted once per committed update with the sanitized HTML state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub html: String,
    pub dirty: Vec<NodeKey>,
    pub source: String,
}
