//! Error types for the CMS client

use extship_core::retry::{RetryError, TransientError};
use thiserror::Error;

/// Result type alias using the CMS client's error type
pub type Result<T> = std::result::Result<T, CmsError>;

/// Failures of a CMS call, converted at the call site
#[derive(Error, Debug)]
pub enum CmsError {
    /// The request never produced a response
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status
    #[error("{operation}: {status} {status_text}{}", detail(.message))]
    Status {
        operation: String,
        status: u16,
        status_text: String,
        message: Option<String>,
    },

    /// The response body did not match the expected schema
    #[error("{operation}: unexpected response: {message}")]
    Decode { operation: String, message: String },

    /// A required attribute was absent from an otherwise valid response
    #[error("{operation}: response is missing '{field}'")]
    MissingField { operation: String, field: String },

    /// The client could not be configured from the credentials
    #[error("Invalid client configuration: {message}")]
    Config { message: String },

    /// A local file could not be read for upload
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({})", m))
        .unwrap_or_default()
}

impl CmsError {
    /// Create a status error
    pub fn status(
        operation: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        Self::Status {
            operation: operation.into(),
            status,
            status_text: status_text.into(),
            message,
        }
    }

    /// Create a decode error
    pub fn decode(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// Create a missing field error
    pub fn missing_field(operation: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            operation: operation.into(),
            field: field.into(),
        }
    }

    /// HTTP status of the failed response, if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CmsError::Status { status, .. } => Some(*status),
            CmsError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Status text of the failed response, if one was received
    pub fn status_text(&self) -> Option<&str> {
        match self {
            CmsError::Status { status_text, .. } => Some(status_text),
            _ => None,
        }
    }
}

impl TransientError for CmsError {
    fn status_code(&self) -> Option<u16> {
        CmsError::status_code(self)
    }

    fn is_network_failure(&self) -> bool {
        match self {
            CmsError::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}

impl From<RetryError<CmsError>> for CmsError {
    fn from(err: RetryError<CmsError>) -> Self {
        err.into_source()
    }
}
