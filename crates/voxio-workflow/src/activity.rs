// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity execution with per-attempt timeouts and bounded retry.
//!
//! Every side effect the orchestrator requests runs through
//! [`run_activity`]: a per-attempt timeout, retries for transient provider
//! errors with capped exponential backoff, and classification of exhausted
//! attempts. Activities themselves must be idempotent, so re-executing one
//! after a crash or timeout is always safe.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use voxio_config::WorkflowConfig;
use voxio_core::VoxioError;

/// Retry policy for one activity invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts (first try plus retries).
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per attempt.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            max_attempts: config.activity_max_attempts.max(1),
            initial_backoff: config.backoff_initial(),
            max_backoff: config.backoff_max(),
            timeout: config.activity_timeout(),
        }
    }

    /// Backoff before `attempt + 1`, deterministic doubling with a cap.
    fn backoff_after(&self, attempt: u32) -> Duration {
        let doubled = self
            .initial_backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        doubled.min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

/// Runs one activity under the policy.
///
/// Transient provider errors and per-attempt timeouts are retried up to
/// `max_attempts`; any other error returns immediately. Exhausted retries
/// surface the last classified error (or [`VoxioError::ActivityTimeout`]
/// when the final attempt timed out).
pub async fn run_activity<T, F, Fut>(
    name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, VoxioError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VoxioError>>,
{
    let mut last_error: Option<VoxioError> = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            let backoff = policy.backoff_after(attempt - 1);
            warn!(activity = name, attempt, backoff_ms = backoff.as_millis() as u64,
                "retrying activity after transient failure");
            tokio::time::sleep(backoff).await;
        }

        match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) if error.is_transient() => {
                warn!(activity = name, attempt, %error, "activity attempt failed");
                last_error = Some(error);
            }
            Ok(Err(error)) => return Err(error),
            Err(_elapsed) => {
                warn!(activity = name, attempt, timeout = ?policy.timeout,
                    "activity attempt timed out");
                last_error = Some(VoxioError::ActivityTimeout {
                    activity: name.to_string(),
                    duration: policy.timeout,
                });
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        VoxioError::Internal(format!("activity `{name}` failed with no recorded error"))
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(400),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = run_activity("test", &fast_policy(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, VoxioError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = run_activity("test", &fast_policy(), move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(VoxioError::transient("rate limited"))
                } else {
                    Ok("CA-123".to_string())
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "CA-123");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "exactly one retry");
    }

    #[tokio::test(start_paused = true)]
    async fn configuration_errors_never_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = run_activity("test", &fast_policy(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VoxioError::Configuration("bad number".into()))
            }
        })
        .await;
        assert!(matches!(result, Err(VoxioError::Configuration(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transient_returns_last_error() {
        let result: Result<(), _> = run_activity("test", &fast_policy(), || async {
            Err(VoxioError::transient("still flaky"))
        })
        .await;
        match result {
            Err(VoxioError::TransientProvider { message, .. }) => {
                assert_eq!(message, "still flaky");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn per_attempt_timeout_classified() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
        };
        let result: Result<(), _> = run_activity("slow_op", &policy, || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        match result {
            Err(VoxioError::ActivityTimeout { activity, duration }) => {
                assert_eq!(activity, "slow_op");
                assert_eq!(duration, Duration::from_millis(50));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(3_000),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(policy.backoff_after(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_after(4), Duration::from_millis(3_000));
        assert_eq!(policy.backoff_after(5), Duration::from_millis(3_000));
    }
}
