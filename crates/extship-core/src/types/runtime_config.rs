//! Runtime settings for remote calls
//!
//! These types control request timeouts, upload concurrency and the retry
//! policy applied to idempotent CMS calls. All fields are optional in the
//! descriptor and fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings carried by a deployment descriptor under `runtime`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of asset uploads in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retry policy for idempotent remote calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl RuntimeSettings {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            retry: RetryPolicy::default(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> usize {
    4
}
fn default_user_agent() -> String {
    format!(
        "extship/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    500
}
fn default_max_delay() -> u64 {
    10_000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// No delay between attempts
    None,

    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff
    LinearBackoff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runtime_settings() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert!(settings.user_agent.starts_with("extship/"));
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.strategy, RetryStrategy::ExponentialBackoff);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_partial_runtime_settings_fill_defaults() {
        let json = r#"{ "concurrency": 1, "retry": { "maxAttempts": 5, "strategy": "fixed-delay" } }"#;
        let settings: RuntimeSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.strategy, RetryStrategy::FixedDelay);
        assert_eq!(settings.retry.initial_delay_ms, 500);
    }

    #[test]
    fn test_single_attempt_policy() {
        let policy = RetryPolicy::single_attempt();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.strategy, RetryStrategy::None);
    }
}
