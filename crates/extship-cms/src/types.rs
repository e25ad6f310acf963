//! Domain types exchanged with the CMS

use camino::Utf8Path;
use serde::Serialize;

use crate::error::{CmsError, Result};

/// An asset stored in the CMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    pub uid: String,
    /// File name the asset is titled with
    pub title: String,
    pub parent_uid: Option<String>,
    /// Public content URL
    pub url: Option<String>,
    pub is_dir: bool,
}

/// An asset folder stored in the CMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub uid: String,
    pub name: String,
    pub parent_uid: Option<String>,
}

/// A file prepared for multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl AssetUpload {
    /// Wrap in-memory content
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file; the asset is titled with the file's base name
    pub async fn from_path(path: &Utf8Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| CmsError::Io {
                path: path.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no file name",
                ),
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|source| CmsError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(Self { file_name, bytes })
    }

    /// File name sent with the upload
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File content
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type inferred from the file extension
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "html" | "htm" => "text/html",
            "js" | "mjs" => "application/javascript",
            "css" => "text/css",
            "json" | "map" => "application/json",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            "ttf" => "font/ttf",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// An existing extension found by lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub uid: String,
    pub title: String,
    pub kind: Option<String>,
}

/// Acknowledgement of an extension create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionAck {
    /// Uid of the written record, when the API echoes it
    pub uid: Option<String>,
    pub notice: String,
}

/// Content-type scope of a widget extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionScope {
    pub content_types: Vec<String>,
}

/// Extension record body sent on create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionRecord {
    pub title: String,
    pub src: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ExtensionScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_width: Option<String>,
}
