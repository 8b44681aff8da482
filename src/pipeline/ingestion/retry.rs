use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::Backend;
use crate::app::ports::HttpResponse;
use crate::config::RetryConfig;
use crate::error::{LoaderError, Result};
use crate::observability::metrics;

/// Bounded retry for transient HTTP failures: transport errors and
/// 429/5xx statuses. Other statuses fail on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// No delay between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::ZERO,
        }
    }

    /// Delay after the given failed attempt (1-based), doubling each time
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1u32 << exponent)
    }

    /// Run `op` until it returns a 2xx response, a non-retryable failure,
    /// or the attempt budget is spent.
    pub async fn send<F, Fut>(&self, backend: Backend, mut op: F) -> Result<HttpResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            metrics::fetch::attempt(backend.as_str());
            let started = Instant::now();
            let outcome = op().await;
            metrics::fetch::duration(backend.as_str(), started.elapsed().as_secs_f64());

            let err = match outcome {
                Ok(resp) if resp.is_success() => {
                    debug!(backend = backend.as_str(), attempt, "request succeeded");
                    return Ok(resp);
                }
                Ok(resp) => LoaderError::Status {
                    backend: backend.as_str().to_string(),
                    status: resp.status,
                },
                Err(e) => e,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= max_attempts {
                return Err(LoaderError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.delay_after(attempt);
            warn!(
                backend = backend.as_str(),
                attempt,
                max_attempts,
                "retrying in {:?} after: {}",
                delay,
                err
            );
            metrics::fetch::retry(backend.as_str());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            bytes: b"{}".to_vec(),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 0,
            backoff_ms: 0,
        });
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_503_until_budget_is_spent() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .send(Backend::Loki, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(response(503)) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(LoaderError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, LoaderError::Status { status: 503, .. }));
            }
            other => panic!("expected exhausted retries, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .send(Backend::Quickwit, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(LoaderError::Transport {
                            message: "connection reset".to_string(),
                            timed_out: false,
                        })
                    } else {
                        Ok(response(200))
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .send(Backend::Prometheus, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(response(400)) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(LoaderError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_429_is_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(2);

        let result = policy
            .send(Backend::Loki, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(response(if n == 0 { 429 } else { 200 })) }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
