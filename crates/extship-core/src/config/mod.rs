//! Configuration loading and management

mod credentials;
mod loader;

pub use credentials::{CmsCredentials, ENV_API_BASE_URL, ENV_API_KEY, ENV_MANAGEMENT_TOKEN};
pub use loader::{DeploymentConfig, Descriptor, DEFAULT_ENTRY_POINT};
