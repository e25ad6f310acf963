//! Fatal pipeline errors

use extship_cms::CmsError;
use thiserror::Error;

/// Result type alias for pipeline stages
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors that abort a deployment
///
/// Registration and purge failures are not represented here; they are
/// recorded in the pipeline report instead.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to resolve references: {0}")]
    References(#[source] extship_core::Error),

    #[error("Failed to resolve asset folder '{name}': {source}")]
    Folder {
        name: String,
        #[source]
        source: CmsError,
    },

    #[error("Failed to upload {file}: {source}")]
    Upload {
        file: String,
        #[source]
        source: CmsError,
    },

    #[error("Uploaded asset {title} has no content URL")]
    MissingUrl { title: String },

    #[error("Failed to read entry point {path}: {source}")]
    EntryPointRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write entry point {path}: {source}")]
    EntryPointWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Create an upload error
    pub fn upload(file: impl Into<String>, source: CmsError) -> Self {
        Self::Upload {
            file: file.into(),
            source,
        }
    }
}
