//! Retry delay strategies and predicates

use crate::types::{RetryPolicy, RetryStrategy};
use rand::RngExt;
use std::time::Duration;

/// Calculate the delay before the next attempt
///
/// `attempt` is the 1-indexed attempt that just failed. With `jitter`, up to
/// 25% of the capped delay is added at random.
///
/// ```rust
/// use extship_core::retry::calculate_delay;
/// use extship_core::types::{RetryPolicy, RetryStrategy};
///
/// let policy = RetryPolicy {
///     max_attempts: 3,
///     strategy: RetryStrategy::ExponentialBackoff,
///     backoff_multiplier: 2.0,
///     initial_delay_ms: 500,
///     max_delay_ms: 10_000,
/// };
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 500);
/// assert_eq!(calculate_delay(&policy, 2, false).as_millis(), 1000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }
        RetryStrategy::LinearBackoff => {
            policy.initial_delay_ms.saturating_mul(attempt_index as u64 + 1)
        }
    };

    let capped_delay_ms = base_delay_ms.min(policy.max_delay_ms);

    let final_delay_ms = if jitter && capped_delay_ms > 0 {
        let jitter_range = capped_delay_ms / 4;
        capped_delay_ms + rand::rng().random_range(0..=jitter_range)
    } else {
        capped_delay_ms
    };

    Duration::from_millis(final_delay_ms)
}

/// Decides whether a failed attempt should be retried
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Whether `error` is worth another attempt
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// No error is retryable
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

#[cfg(test)]
impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E) -> bool {
        false
    }
}

/// Errors that know whether they are transient
pub trait TransientError {
    /// HTTP status code of the failed response, if one was received
    fn status_code(&self) -> Option<u16>;

    /// Whether the failure happened before any response (connect, timeout)
    fn is_network_failure(&self) -> bool;
}

/// Retries network failures and transient HTTP statuses
///
/// Default retryable statuses: 408, 425, 429 and every 5xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientPredicate;

impl TransientPredicate {
    /// Whether a status code is worth retrying
    pub fn is_retryable_code(code: u16) -> bool {
        matches!(code, 408 | 425 | 429) || (500..=599).contains(&code)
    }
}

impl<E: TransientError> RetryPredicate<E> for TransientPredicate {
    fn should_retry(&self, error: &E) -> bool {
        match error.status_code() {
            Some(code) => Self::is_retryable_code(code),
            None => error.is_network_failure(),
        }
    }
}
