use thiserror::Error;

use crate::document::NodeKey;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("node {0} does not exist")]
    MissingNode(NodeKey),
    #[error("index {index} is out of bounds for node {parent} with {len} children")]
    InvalidIndex {
        parent: NodeKey,
        index: usize,
        len: usize,
    },
    #[error("the root node cannot be removed, moved or wrapped")]
    RootMutation,
    #[error("moving {key} under {parent} would create a cycle")]
    Cycle { key: NodeKey, parent: NodeKey },
    #[error("node {0} is not a text node")]
    NotText(NodeKey),
    #[error("nodes to wrap must be siblings")]
    NotSiblings,
    #[error("normalization did not converge after {0} iterations")]
    NormalizeDidNotConverge(usize),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("invalid payload for `{command}`: {message}")]
    InvalidPayload { command: String, message: String },
    #[error("history snapshot could not be restored: {0}")]
    Snapshot(String),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl CommandError {
    pub fn invalid_payload(command: &str, message: impl Into<String>) -> Self {
        CommandError::InvalidPayload {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported document schema `{schema}` version {version}")]
    UnsupportedSchema { schema: String, version: u32 },
    #[error("node type `{0}` is not registered")]
    UnknownNodeType(String),
    #[error("node key {0} appears more than once")]
    DuplicateKey(NodeKey),
    #[error("document root must have type `root`, found `{0}`")]
    InvalidRoot(String),
    #[error("duplicate {what} `{id}`")]
    Registry { what: &'static str, id: String },
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("unsupported file type `{0}`")]
    UnsupportedType(String),
    #[error("uploaded image url `{0}` was rejected")]
    RejectedUrl(String),
    #[error(transparent)]
    Editor(#[from] EditorError),
}
