//! Bounded exponential-backoff retry for fallible remote calls.
//!
//! [`retry`] is a generic decorator: it is parameterized by a transience
//! predicate rather than any provider-specific error type, so new
//! providers plug in without duplicating retry logic. Non-transient
//! errors (validation, content-policy rejection) bypass retry entirely
//! and are returned from the first attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Fraction of the delay randomized as jitter (0.0 disables it).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Apply random jitter to a delay: `delay * (1 ± jitter)`.
pub fn with_jitter(delay: Duration, config: &RetryConfig) -> Duration {
    if config.jitter <= 0.0 {
        return delay;
    }
    let spread = delay.as_millis() as f64 * config.jitter;
    let offset = rand::rng().random_range(-spread..=spread);
    let ms = (delay.as_millis() as f64 + offset).max(0.0) as u64;
    Duration::from_millis(ms)
}

/// Run `op` up to `config.max_attempts` times, sleeping with jittered
/// exponential backoff between transient failures.
///
/// `is_transient` decides whether an error is worth retrying; a
/// non-transient error is returned immediately. On success the number of
/// attempts is transparent to the caller. On exhaustion the last error
/// is returned.
pub async fn retry<T, E, Op, Fut, Pred>(
    config: &RetryConfig,
    is_transient: Pred,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Pred: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;

    for attempt in 1..=config.max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !is_transient(&e) => {
                tracing::debug!(attempt, error = %e, "Non-transient failure, not retrying");
                return Err(e);
            }
            Err(e) if attempt == config.max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "Retries exhausted",
                );
                return Err(e);
            }
            Err(e) => {
                let sleep_for = with_jitter(delay, config);
                tracing::warn!(
                    attempt,
                    delay_ms = sleep_for.as_millis() as u64,
                    error = %e,
                    "Transient failure, backing off before retry",
                );
                tokio::time::sleep(sleep_for).await;
                delay = next_delay(delay, config);
            }
        }
    }

    unreachable!("max_attempts is at least 1");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(80),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    #[test]
    fn next_delay_doubles() {
        let config = RetryConfig::default();
        let d = next_delay(Duration::from_secs(1), &config);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(8), &config);
        assert_eq!(d, Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = RetryConfig::default();
        let mut delay = config.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30];

        for &expected_secs in &expected {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = next_delay(delay, &config);
        }
    }

    #[test]
    fn jitter_stays_within_spread() {
        let config = RetryConfig {
            jitter: 0.5,
            ..Default::default()
        };
        for _ in 0..100 {
            let d = with_jitter(Duration::from_millis(1000), &config);
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(&quick_config(), |_| true, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("throttled".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_bypasses_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry(
            &quick_config(),
            |e: &String| e != "content policy",
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("content policy".to_string()) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "content policy");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry(&quick_config(), |_| true, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {attempt}")) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
