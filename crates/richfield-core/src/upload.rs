use serde::{Deserialize, Serialize};

use crate::core::Editor;
use crate::document::NodeKey;
use crate::error::UploadError;
use crate::nodes::NodeKind;
use crate::plugin::CommandOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// What the host's upload endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// The host's upload endpoint. Called synchronously; nothing is inserted until it returns.
pub trait Uploader {
    fn upload(&mut self, file: &UploadFile, alt: &str) -> Result<UploadedImage, UploadError>;
}

impl Editor {
    /// Uploads `file` and inserts the resulting image at the caret. Returns the
    /// new image node. Failures leave the document untouched.
    pub fn upload_image(
        &mut self,
        uploader: &mut dyn Uploader,
        file: &UploadFile,
        alt: &str,
    ) -> Result<NodeKey, UploadError> {
        if !file.is_image() {
            return Err(UploadError::UnsupportedType(file.content_type.clone()));
        }
        let uploaded = uploader.upload(file, alt).map_err(|err| {
            tracing::warn!(file = %file.name, %err, "image upload failed");
            err
        })?;

        let mut payload = serde_json::json!({
            "src": uploaded.url,
            "altText": uploaded.alt.as_deref().unwrap_or(alt),
        });
        if let Some(width) = uploaded.width {
            payload["width"] = width.into();
        }
        if let Some(height) = uploaded.height {
            payload["height"] = height.into();
        }

        let mut image = None;
        let outcome = self.update("upload", |txn| {
            let outcome = txn.dispatch("image.insert", &payload)?;
            image = txn
                .inserted_keys()
                .iter()
                .copied()
                .find(|key| txn.doc().kind(*key) == Some(NodeKind::Image));
            Ok(outcome)
        })?;
        match (outcome, image) {
            (CommandOutcome::Handled, Some(key)) => Ok(key),
            _ => Err(UploadError::RejectedUrl(uploaded.url)),
        }
    }
}
