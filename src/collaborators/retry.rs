//! Bounded retry with backoff for collaborator calls
//!
//! Every attempt gets its own timeout; after the attempt budget is spent the
//! last error is returned and the stage's documented failure/degradation
//! applies. The bound is deliberately small — collaborators are network
//! services and the citizen is waiting on the intake response.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::warn;

use super::CollaboratorError;

/// Attempt budget and timing for one collaborator stage
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts (first call + retries)
    pub attempts: u32,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Base backoff, multiplied by the attempt number
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            // One retry with backoff
            attempts: 2,
            timeout: Duration::from_secs(10),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Run `op` under the policy, returning the first success or the last error.
pub async fn call_with_retry<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, CollaboratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = CollaboratorError::Transport("no attempt made".to_string());

    for attempt in 1..=attempts {
        match timeout(policy.timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                warn!(collaborator = label, attempt, error = %e, "collaborator call failed");
                last_error = e;
            }
            Err(_) => {
                warn!(collaborator = label, attempt, "collaborator call timed out");
                last_error = CollaboratorError::Timeout(policy.timeout);
            }
        }
        if attempt < attempts {
            sleep(policy.backoff * attempt).await;
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 2,
            timeout: Duration::from_millis(200),
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("test", &fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CollaboratorError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_once_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("test", &fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(CollaboratorError::Transport("flaky".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausts_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = call_with_retry("test", &fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CollaboratorError::Transport("down".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_attempt() {
        let policy = RetryPolicy {
            attempts: 2,
            timeout: Duration::from_millis(10),
            backoff: Duration::from_millis(1),
        };
        let result: Result<u32, _> = call_with_retry("test", &policy, || async {
            sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;
        match result {
            Err(CollaboratorError::Timeout(_)) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
