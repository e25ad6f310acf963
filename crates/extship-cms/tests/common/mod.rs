//! Shared helpers for CMS client integration tests

#![allow(dead_code)]

pub mod mock_server;

use extship_cms::CmsClient;
use extship_core::types::{RetryPolicy, RetryStrategy, RuntimeSettings};
use extship_core::CmsCredentials;

pub const TEST_API_KEY: &str = "blt-test-api-key";
pub const TEST_TOKEN: &str = "cs-test-management-token";

/// Runtime settings with millisecond retry delays
pub fn fast_settings(max_attempts: u32) -> RuntimeSettings {
    RuntimeSettings {
        timeout_secs: 5,
        retry: RetryPolicy {
            max_attempts,
            strategy: RetryStrategy::FixedDelay,
            backoff_multiplier: 1.0,
            initial_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..RuntimeSettings::default()
    }
}

/// Client pointed at a mock server
pub fn client_for(base_url: &str) -> CmsClient {
    client_with(base_url, fast_settings(3))
}

pub fn client_with(base_url: &str, settings: RuntimeSettings) -> CmsClient {
    let credentials = CmsCredentials::new(base_url, TEST_API_KEY, TEST_TOKEN).unwrap();
    CmsClient::new(&credentials, &settings).unwrap()
}
