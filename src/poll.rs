//! Bounded retry for resources the server computes asynchronously.
//!
//! Upload details, summaries and reports are produced by background agents.
//! Until they are available the server answers `503 Service Unavailable`
//! with a `Retry-After` header. Endpoints classify every response as an
//! [`Attempt`] and [`poll`] decides whether to return, sleep or give up.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{FossologyError, Result};

/// Status the server uses to signal "not ready yet".
pub const NOT_READY: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Attempt bound for report generation, upload summary, licenses and copyrights.
pub const SHORT_POLL_ATTEMPTS: u32 = 3;

/// Attempt bound for upload details and report downloads.
pub const LONG_POLL_ATTEMPTS: u32 = 10;

/// Delay used when the server signals "not ready" without a `Retry-After`.
pub const FALLBACK_RETRY_SECS: u64 = 1;

/// Outcome of a single request against a polled resource.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The resource is available.
    Ready(T),
    /// The server is still working on it.
    NotReady { retry_after: Option<u64> },
    /// Any other outcome; never retried.
    Failed(FossologyError),
}

/// How often and how long to wait for a polled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of requests, including the first one.
    pub max_attempts: u32,
    /// Caller-imposed delay in seconds, overriding `Retry-After`.
    pub wait_time: Option<u64>,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            wait_time: None,
        }
    }

    /// Set a fixed delay between attempts. Zero leaves the delay unset.
    #[must_use]
    pub fn with_wait_time(mut self, seconds: u64) -> Self {
        self.wait_time = (seconds > 0).then_some(seconds);
        self
    }

    /// Seconds to sleep after a "not ready" answer.
    pub fn delay(&self, retry_after: Option<u64>) -> u64 {
        self.wait_time
            .or(retry_after)
            .unwrap_or(FALLBACK_RETRY_SECS)
    }
}

/// Repeat `attempt` until it is ready, fails, or the policy is exhausted.
///
/// `attempt` receives the 1-based attempt number. No sleep follows the final
/// attempt. Exhaustion yields [`FossologyError::RetryExhausted`] carrying
/// `description`.
pub async fn poll<T, F, Fut>(policy: &RetryPolicy, description: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for n in 1..=max_attempts {
        match attempt(n).await {
            Attempt::Ready(value) => return Ok(value),
            Attempt::Failed(err) => return Err(err),
            Attempt::NotReady { retry_after } => {
                if n == max_attempts {
                    break;
                }
                let secs = policy.delay(retry_after);
                tracing::debug!(
                    attempt = n,
                    max_attempts,
                    retry_in = secs,
                    "{description} not ready yet"
                );
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }
        }
    }

    tracing::warn!(max_attempts, "{description} still not ready, giving up");
    Err(FossologyError::RetryExhausted {
        description: description.to_string(),
        attempts: max_attempts,
    })
}
