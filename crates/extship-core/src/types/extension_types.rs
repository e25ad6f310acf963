//! Extension kind definitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// The kind of extension registered with the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    /// Custom field rendered inside the entry editor
    Field,
    /// Sidebar widget scoped to content types
    Widget,
    /// Dashboard widget
    Dashboard,
}

impl ExtensionKind {
    /// Wire name of the kind, as used in the `type` attribute of extension records
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Field => "field",
            ExtensionKind::Widget => "widget",
            ExtensionKind::Dashboard => "dashboard",
        }
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "field" => Ok(ExtensionKind::Field),
            "widget" => Ok(ExtensionKind::Widget),
            "dashboard" => Ok(ExtensionKind::Dashboard),
            _ => Err(Error::invalid_extension_kind(s)),
        }
    }
}

/// Kind-specific attributes attached to the extension record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFields {
    /// A field carries the data type it stores
    Field { data_type: String },

    /// A widget carries a data type and the content types it is scoped to
    Widget {
        data_type: String,
        content_types: Vec<String>,
    },

    /// A dashboard carries its default width (`full` or `half`)
    Dashboard { default_width: Option<String> },
}

impl KindFields {
    /// The extension kind these fields belong to
    pub fn kind(&self) -> ExtensionKind {
        match self {
            KindFields::Field { .. } => ExtensionKind::Field,
            KindFields::Widget { .. } => ExtensionKind::Widget,
            KindFields::Dashboard { .. } => ExtensionKind::Dashboard,
        }
    }

    /// Data type for kinds that have one
    pub fn data_type(&self) -> Option<&str> {
        match self {
            KindFields::Field { data_type } | KindFields::Widget { data_type, .. } => {
                Some(data_type)
            }
            KindFields::Dashboard { .. } => None,
        }
    }
}
