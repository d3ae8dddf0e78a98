//! Uploaded red-line boundary file
//!
//! The browser reads the selected file, base64-encodes it and posts the
//! result as a JSON hidden field. Once validated the whole record is stored
//! under the auxiliary bucket; it is replaced wholesale on re-upload and set
//! to null on removal, never patched.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::fields;
use crate::format::{format_file_size, format_timestamp};
use crate::state::{FormState, StateMap};

/// Stored boundary file record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryFile {
    pub filename: String,
    /// Declared size in bytes (client supplied)
    pub size: u64,
    pub content_type: String,
    /// Base64 file content
    #[serde(alias = "buffer")]
    pub content: String,
    /// RFC 3339 upload time
    pub uploaded_at: String,
}

impl BoundaryFile {
    /// Read the stored file from form state; a null or malformed entry reads as none
    pub fn from_state(state: &FormState) -> Option<Self> {
        state
            .bucket_value(fields::BOUNDARY_FILE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Bucket update storing this file, replacing any previous one
    pub fn to_bucket_update(&self) -> StateMap {
        let mut update = StateMap::new();
        // Serializing a struct of strings and integers cannot fail
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        update.insert(fields::BOUNDARY_FILE.to_string(), value);
        update
    }

    /// Bucket update clearing the stored file
    pub fn removal_update() -> StateMap {
        let mut update = StateMap::new();
        update.insert(fields::BOUNDARY_FILE.to_string(), Value::Null);
        update
    }

    /// Decoded content for display
    ///
    /// JSON content is pretty-printed. Anything else is shown as decoded text,
    /// and content that is not valid base64 is shown as stored.
    pub fn display_content(&self) -> String {
        let decoded = match STANDARD.decode(self.content.trim()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => return self.content.clone(),
        };

        serde_json::from_str::<Value>(&decoded)
            .ok()
            .and_then(|parsed| serde_json::to_string_pretty(&parsed).ok())
            .unwrap_or(decoded)
    }

    pub fn formatted(&self) -> FormattedBoundaryFile {
        FormattedBoundaryFile {
            filename: self.filename.clone(),
            formatted_size: format_file_size(self.size),
            content_type: self.content_type.clone(),
            uploaded_at: format_timestamp(&self.uploaded_at),
            content: self.display_content(),
        }
    }
}

/// Boundary file decorated for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedBoundaryFile {
    pub filename: String,
    pub formatted_size: String,
    pub content_type: String,
    pub uploaded_at: String,
    pub content: String,
}
