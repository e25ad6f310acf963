//! Response schemas per endpoint
//!
//! The wire shapes are deserialized leniently (every attribute optional) and
//! then validated into the crate's domain types, so a missing uid or URL is
//! reported as [`CmsError::MissingField`] naming the operation instead of a
//! generic decode failure.

use serde::Deserialize;

use crate::error::{CmsError, Result};
use crate::types::{ExtensionAck, ExtensionSummary, RemoteAsset, RemoteFolder};

/// An asset or folder entry as returned by the assets endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetEntry {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_uid: Option<String>,
    #[serde(default)]
    pub is_dir: bool,
}

impl AssetEntry {
    /// Validate the entry as a file asset
    pub fn into_asset(self, operation: &str) -> Result<RemoteAsset> {
        let uid = non_empty(self.uid).ok_or_else(|| CmsError::missing_field(operation, "uid"))?;
        let title = non_empty(self.title)
            .or(non_empty(self.filename))
            .or(non_empty(self.name))
            .ok_or_else(|| CmsError::missing_field(operation, "title"))?;

        Ok(RemoteAsset {
            uid,
            title,
            parent_uid: self.parent_uid,
            url: non_empty(self.url),
            is_dir: self.is_dir,
        })
    }

    /// Validate the entry as a folder
    pub fn into_folder(self, operation: &str) -> Result<RemoteFolder> {
        let uid = non_empty(self.uid).ok_or_else(|| CmsError::missing_field(operation, "uid"))?;
        let name = non_empty(self.name)
            .or(non_empty(self.title))
            .ok_or_else(|| CmsError::missing_field(operation, "name"))?;

        Ok(RemoteFolder {
            uid,
            name,
            parent_uid: self.parent_uid,
        })
    }
}

/// `GET /v3/assets`
#[derive(Debug, Default, Deserialize)]
pub struct AssetListResponse {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

/// `POST /v3/assets`, `PUT /v3/assets/{uid}`, `POST /v3/assets/folders`
#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub asset: Option<AssetEntry>,
}

impl AssetResponse {
    /// The asset entry, which every successful write returns
    pub fn into_entry(self, operation: &str) -> Result<AssetEntry> {
        self.asset
            .ok_or_else(|| CmsError::missing_field(operation, "asset"))
    }
}

/// An extension entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionEntry {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ExtensionEntry {
    /// Validate the entry as a lookup result
    pub fn into_summary(self, operation: &str) -> Result<ExtensionSummary> {
        Ok(ExtensionSummary {
            uid: non_empty(self.uid).ok_or_else(|| CmsError::missing_field(operation, "uid"))?,
            title: self.title.unwrap_or_default(),
            kind: self.kind,
        })
    }
}

/// `GET /v3/extensions`
#[derive(Debug, Default, Deserialize)]
pub struct ExtensionListResponse {
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
}

/// `POST /v3/extensions`, `PUT /v3/extensions/{uid}`
#[derive(Debug, Deserialize)]
pub struct ExtensionResponse {
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub extension: Option<ExtensionEntry>,
}

impl ExtensionResponse {
    /// Acknowledgement for a create or update
    pub fn into_ack(self, fallback_notice: &str) -> ExtensionAck {
        ExtensionAck {
            uid: self.extension.and_then(|e| non_empty(e.uid)),
            notice: self
                .notice
                .unwrap_or_else(|| fallback_notice.to_string()),
        }
    }
}

/// `DELETE /v3/assets/{uid}`
#[derive(Debug, Default, Deserialize)]
pub struct NoticeResponse {
    #[serde(default)]
    pub notice: Option<String>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message combining the error and its field errors
    pub fn message(&self) -> Option<String> {
        let message = self.error_message.clone()?;
        match &self.errors {
            Some(serde_json::Value::Object(fields)) if !fields.is_empty() => {
                let details: Vec<String> = fields
                    .iter()
                    .map(|(field, value)| format!("{}: {}", field, flatten(value)))
                    .collect();
                Some(format!("{} [{}]", message, details.join("; ")))
            }
            _ => Some(message),
        }
    }
}

fn flatten(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
