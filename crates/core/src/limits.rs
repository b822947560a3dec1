//! Pure admission decisions for the cost & rate limiter.
//!
//! These functions decide; they do not touch storage. The rolling-spend
//! ceiling is a separate concern enforced atomically by the ledger
//! repository at charge time (a conditional insert, never
//! read-then-write), because it must be raced against concurrent workers.

use std::time::Duration;

use crate::types::Timestamp;

/// Limiter configuration shared across tenants.
#[derive(Debug, Clone)]
pub struct LimitConfig {
    /// Rolling-spend ceiling per tenant, in cents.
    pub spend_ceiling_cents: i64,
    /// Length of the rolling spend window.
    pub spend_window: Duration,
    /// Minimum time between successive generation runs for one persona.
    pub cooldown: Duration,
    /// Global ceiling on concurrently processing jobs.
    pub max_inflight_jobs: i64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            spend_ceiling_cents: 5_000,
            spend_window: Duration::from_secs(24 * 60 * 60),
            cooldown: Duration::from_secs(5 * 60),
            max_inflight_jobs: 32,
        }
    }
}

/// Why an admission check rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitReason {
    SpendCeiling,
    Cooldown,
    InflightCeiling,
}

impl LimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitReason::SpendCeiling => "spend ceiling exceeded",
            LimitReason::Cooldown => "persona regeneration cooldown active",
            LimitReason::InflightCeiling => "too many jobs in flight",
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    Rejected {
        reason: LimitReason,
        retry_after: Duration,
    },
}

/// Check the per-persona regeneration cooldown.
///
/// `last_generation_at` is the persona's most recent completed run;
/// `None` means the persona has never generated and is always admitted.
pub fn check_cooldown(
    last_generation_at: Option<Timestamp>,
    now: Timestamp,
    config: &LimitConfig,
) -> LimitDecision {
    let Some(last) = last_generation_at else {
        return LimitDecision::Allowed;
    };

    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    if elapsed >= config.cooldown {
        LimitDecision::Allowed
    } else {
        LimitDecision::Rejected {
            reason: LimitReason::Cooldown,
            retry_after: config.cooldown - elapsed,
        }
    }
}

/// Check the global in-flight-jobs ceiling.
pub fn check_inflight(processing_jobs: i64, config: &LimitConfig) -> LimitDecision {
    if processing_jobs < config.max_inflight_jobs {
        LimitDecision::Allowed
    } else {
        LimitDecision::Rejected {
            reason: LimitReason::InflightCeiling,
            // No better signal than "try again shortly".
            retry_after: Duration::from_secs(30),
        }
    }
}

/// Retry-after hint for a spend-ceiling rejection: the remainder of the
/// rolling window is the worst case, so suggest a fraction of it.
pub fn spend_retry_after(config: &LimitConfig) -> Duration {
    config.spend_window / 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn config() -> LimitConfig {
        LimitConfig {
            cooldown: Duration::from_secs(300),
            max_inflight_jobs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn first_generation_is_always_admitted() {
        assert_eq!(
            check_cooldown(None, Utc::now(), &config()),
            LimitDecision::Allowed
        );
    }

    #[test]
    fn cooldown_rejects_with_remaining_time() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(100);
        let decision = check_cooldown(Some(last), now, &config());
        assert_matches!(
            decision,
            LimitDecision::Rejected {
                reason: LimitReason::Cooldown,
                retry_after,
            } => {
                assert!(retry_after <= Duration::from_secs(200));
                assert!(retry_after >= Duration::from_secs(199));
            }
        );
    }

    #[test]
    fn cooldown_admits_after_window() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(301);
        assert_eq!(
            check_cooldown(Some(last), now, &config()),
            LimitDecision::Allowed
        );
    }

    #[test]
    fn inflight_ceiling() {
        assert_eq!(check_inflight(1, &config()), LimitDecision::Allowed);
        assert_matches!(
            check_inflight(2, &config()),
            LimitDecision::Rejected {
                reason: LimitReason::InflightCeiling,
                ..
            }
        );
    }
}
