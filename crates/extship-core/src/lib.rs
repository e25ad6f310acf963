//! # extship-core
//!
//! Core library for the extship CLI providing:
//! - Deployment descriptor loading (including `ref` indirection)
//! - Build-log reference scanning
//! - Type definitions for extensions, runtime settings and credentials
//! - Retry execution engine with policy-based configuration

pub mod config;
pub mod error;
pub mod references;
pub mod retry;
pub mod types;

pub use config::{CmsCredentials, DeploymentConfig};
pub use error::{Error, Result};
pub use references::{ReferenceMap, ReferencePattern};
