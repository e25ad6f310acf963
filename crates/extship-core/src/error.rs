//! Error types for extship-core

use thiserror::Error;

/// Result type alias using extship-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for extship
#[derive(Error, Debug)]
pub enum Error {
    /// Descriptor file not found
    #[error("Deployment descriptor not found: {path}")]
    DescriptorNotFound { path: String },

    /// Invalid descriptor contents
    #[error("Invalid deployment descriptor: {message}")]
    InvalidConfig { message: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Unknown extension kind
    #[error("Unknown extension kind: {kind}. Valid kinds: field, widget, dashboard")]
    InvalidExtensionKind { kind: String },

    /// Reference pattern did not compile or lacks a capture group
    #[error("Invalid reference pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Missing CMS credential
    #[error("Missing CMS credential: {name}")]
    MissingCredential { name: String },
}

impl Error {
    /// Create a descriptor not found error
    pub fn descriptor_not_found(path: impl Into<String>) -> Self {
        Self::DescriptorNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid extension kind error
    pub fn invalid_extension_kind(kind: impl Into<String>) -> Self {
        Self::InvalidExtensionKind { kind: kind.into() }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }
}
