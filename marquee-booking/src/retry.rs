//! Retry policies for best-effort calls to remote services.

use std::future::Future;
use std::time::Duration;

use marquee_store::app_config::{RetryConfig, RetryStrategy};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RetryPolicy {
    /// Single attempt
    None { timeout: Duration },

    /// `attempts` tries with a constant `delay` between them
    Fixed {
        attempts: u32,
        delay: Duration,
        timeout: Duration,
    },

    /// Delay doubles after each failed try, capped at `max_delay`
    Exponential {
        attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        timeout: Duration,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        let timeout = Duration::from_millis(config.attempt_timeout_ms);
        let attempts = config.max_attempts.max(1);
        match config.strategy {
            RetryStrategy::None => Self::None { timeout },
            RetryStrategy::Fixed => Self::Fixed {
                attempts,
                delay: Duration::from_millis(config.delay_ms),
                timeout,
            },
            RetryStrategy::Exponential => Self::Exponential {
                attempts,
                initial_delay: Duration::from_millis(config.delay_ms),
                max_delay: Duration::from_millis(config.max_delay_ms),
                timeout,
            },
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::None { .. } => 1,
            Self::Fixed { attempts, .. } | Self::Exponential { attempts, .. } => *attempts,
        }
    }

    fn timeout(&self) -> Duration {
        match self {
            Self::None { timeout } | Self::Fixed { timeout, .. } | Self::Exponential { timeout, .. } => *timeout,
        }
    }

    /// Delay before retry number `retry` (0 for the first retry).
    fn delay(&self, retry: u32) -> Duration {
        match self {
            Self::None { .. } => Duration::ZERO,
            Self::Fixed { delay, .. } => *delay,
            Self::Exponential {
                initial_delay,
                max_delay,
                ..
            } => initial_delay
                .saturating_mul(2u32.saturating_pow(retry))
                .min(*max_delay),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("Gave up after {attempts} attempts: attempt timed out after {timeout:?}")]
    TimedOut { attempts: u32, timeout: Duration },
}

/// Run `operation` under `policy`. Each attempt is bounded by the policy's
/// per-attempt timeout.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.attempts();
    let timeout = policy.timeout();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let failure = match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => RetryError::Exhausted { attempts: attempt, last: e },
            Err(_) => RetryError::TimedOut { attempts: attempt, timeout },
        };

        if attempt >= attempts {
            return Err(failure);
        }

        let delay = policy.delay(attempt - 1);
        debug!(attempt, ?delay, "Retrying after failure: {}", failure);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fixed(attempts: u32) -> RetryPolicy {
        RetryPolicy::Fixed {
            attempts,
            delay: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert!(matches!(policy, RetryPolicy::Exponential { .. }));

        let none = RetryPolicy::from_config(&RetryConfig {
            strategy: RetryStrategy::None,
            ..RetryConfig::default()
        });
        assert_eq!(none.attempts(), 1);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy::Exponential {
            attempts: 6,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = execute_with_retry(&fixed(3), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = execute_with_retry(&fixed(2), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("down")
            }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 2, last: "down" })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let policy = RetryPolicy::None {
            timeout: Duration::from_millis(20),
        };
        let result: Result<(), RetryError<&str>> = execute_with_retry(&policy, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(RetryError::TimedOut { attempts: 1, .. })));
    }
}
