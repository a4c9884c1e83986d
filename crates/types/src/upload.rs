//! Upload requests and responses exchanged with the upload collaborator

use crate::field::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Handle identifying one outstanding upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadTicket(pub u64);

/// A file picked by the user
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    /// Mime type reported by the picker, if any
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            data,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// What gets handed to the uploader
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    /// Schema of the field the file is for
    pub field: Field,
    pub content_id: Option<String>,
    /// Accepted mime types, empty when anything goes
    pub accept: Vec<String>,
    pub file: UploadFile,
}

/// Successful upload result as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}

impl UploadResponse {
    /// Parse a raw response body.
    ///
    /// The body is JSON; an `error` key means the server refused the file.
    pub fn parse(body: &str) -> Result<Self, UploadError> {
        let value: Value = serde_json::from_str(body.trim()).map_err(|e| {
            log::debug!("Unreadable upload response: {}", e);
            UploadError::Unreadable
        })?;

        if let Some(error) = value.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(UploadError::Rejected(message));
        }

        serde_json::from_value(value).map_err(|_| UploadError::Malformed)
    }
}

/// Upload failures; these end up in the file widget's error list
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("Unable to interpret response.")]
    Unreadable,
    #[error("The upload response is missing the file path or mime type.")]
    Malformed,
    #[error("{0}")]
    Rejected(String),
    #[error("File type {mime} is not allowed here.")]
    NotAccepted { mime: String },
    #[error("Upload failed: {0}")]
    Transport(String),
}
