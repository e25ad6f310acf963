//! Retry execution engine with policy-based configuration
//!
//! Every idempotent CMS call goes through a [`RetryExecutor`]. The executor
//! runs an async operation, asks a [`RetryPredicate`] whether a failure is
//! worth another attempt, sleeps according to the [`RetryPolicy`] and reports
//! each step to a [`RetryObserver`].
//!
//! # Example
//!
//! ```rust,no_run
//! use extship_core::retry::{RetryExecutor, TracingObserver};
//! use extship_core::types::RetryPolicy;
//!
//! async fn example() {
//!     let executor = RetryExecutor::new(RetryPolicy::default())
//!         .with_observer(TracingObserver::new("list assets"));
//!
//!     let result = executor
//!         .execute(|| async { Ok::<_, std::io::Error>("done") })
//!         .await;
//!     assert!(result.is_ok());
//! }
//! ```
//!
//! [`RetryPolicy`]: crate::types::RetryPolicy

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::RetryExecutor;
pub use observer::{NoOpObserver, RetryObserver, TracingObserver};
pub use strategies::{
    calculate_delay, AlwaysRetry, RetryPredicate, TransientError, TransientPredicate,
};
