//! CMS credentials
//!
//! Credentials are resolved once at the CLI edge (flags, falling back to the
//! environment through clap) and handed to the CMS client explicitly.

use std::fmt;

use crate::error::{Error, Result};

/// Environment variable holding the management API base URL
pub const ENV_API_BASE_URL: &str = "CS_CM_API_BASE_URL";
/// Environment variable holding the stack API key
pub const ENV_API_KEY: &str = "CS_API_KEY";
/// Environment variable holding the management token
pub const ENV_MANAGEMENT_TOKEN: &str = "CS_MANAGEMENT_TOKEN";

/// Credentials and endpoint for the content-management API
#[derive(Clone, PartialEq, Eq)]
pub struct CmsCredentials {
    base_url: String,
    api_key: String,
    management_token: String,
}

impl CmsCredentials {
    /// Build credentials, rejecting blank values
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        management_token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let api_key = api_key.into();
        let management_token = management_token.into();

        if base_url.trim().is_empty() {
            return Err(Error::missing_credential(ENV_API_BASE_URL));
        }
        if api_key.trim().is_empty() {
            return Err(Error::missing_credential(ENV_API_KEY));
        }
        if management_token.trim().is_empty() {
            return Err(Error::missing_credential(ENV_MANAGEMENT_TOKEN));
        }

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            management_token,
        })
    }

    /// Build credentials from optional parts, naming the first missing one
    pub fn from_parts(
        base_url: Option<String>,
        api_key: Option<String>,
        management_token: Option<String>,
    ) -> Result<Self> {
        Self::new(
            base_url.ok_or_else(|| Error::missing_credential(ENV_API_BASE_URL))?,
            api_key.ok_or_else(|| Error::missing_credential(ENV_API_KEY))?,
            management_token.ok_or_else(|| Error::missing_credential(ENV_MANAGEMENT_TOKEN))?,
        )
    }

    /// API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stack API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Management token
    pub fn management_token(&self) -> &str {
        &self.management_token
    }
}

impl fmt::Debug for CmsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("management_token", &"<redacted>")
            .finish()
    }
}
