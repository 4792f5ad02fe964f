//! Rate policy values and cleanup tuning.

use super::error::{LimiterError, LimiterResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time-to-live of an untouched bucket.
pub const DEFAULT_BUCKET_TTL: Duration = Duration::from_secs(300);

/// Default number of engine calls between two lazy sweeps.
pub const DEFAULT_SWEEP_THRESHOLD: u64 = 1000;

/// Default token cost of a single request.
pub const DEFAULT_COST: u32 = 1;

/// Validated token-bucket parameters for one policy tier.
///
/// The engine accepts raw numbers on every call; `RatePolicy` exists so the
/// validation can happen once, at startup, instead of on every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePolicy {
    capacity: f64,
    refill_rate: f64,
}

impl RatePolicy {
    /// Build a policy from a burst capacity and a refill rate in tokens/second.
    pub fn new(capacity: f64, refill_rate: f64) -> LimiterResult<Self> {
        validate_capacity(capacity)?;
        validate_refill_rate(refill_rate)?;
        Ok(Self {
            capacity,
            refill_rate,
        })
    }

    /// Build a policy allowing `limit` tokens per `period`.
    ///
    /// The capacity equals `limit` and the refill rate is `limit / period`,
    /// so an idle client can burst the whole period's allowance at once.
    pub fn per_period(limit: u32, period: Duration) -> LimiterResult<Self> {
        let secs = period.as_secs_f64();
        if !(secs.is_finite() && secs > 0.0) {
            return Err(LimiterError::InvalidPeriod(secs));
        }
        let capacity = f64::from(limit);
        Self::new(capacity, capacity / secs)
    }

    /// Maximum token balance (burst size).
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens credited per second.
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Capacity rounded down, as advertised in `X-RateLimit-Limit`.
    pub fn limit(&self) -> u64 {
        self.capacity.floor() as u64
    }
}

/// Tuning for the amortized stale-bucket sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// A bucket untouched for longer than this is evicted by the next sweep.
    pub ttl: Duration,
    /// Number of engine calls between two sweeps.
    pub sweep_threshold: u64,
}

impl CleanupPolicy {
    pub fn new(ttl: Duration, sweep_threshold: u64) -> Self {
        Self {
            ttl,
            sweep_threshold: sweep_threshold.max(1),
        }
    }
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_TTL, DEFAULT_SWEEP_THRESHOLD)
    }
}

pub(crate) fn validate_capacity(capacity: f64) -> LimiterResult<()> {
    if capacity.is_finite() && capacity > 0.0 {
        Ok(())
    } else {
        Err(LimiterError::InvalidCapacity(capacity))
    }
}

pub(crate) fn validate_refill_rate(refill_rate: f64) -> LimiterResult<()> {
    if refill_rate.is_finite() && refill_rate > 0.0 {
        Ok(())
    } else {
        Err(LimiterError::InvalidRefillRate(refill_rate))
    }
}

pub(crate) fn validate_cost(cost: u32) -> LimiterResult<()> {
    if cost == 0 {
        Err(LimiterError::InvalidCost)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_period_derives_refill_rate() {
        let policy = RatePolicy::per_period(100, Duration::from_secs(60)).unwrap();
        assert_eq!(policy.capacity(), 100.0);
        assert!((policy.refill_rate() - 100.0 / 60.0).abs() < 1e-12);
        assert_eq!(policy.limit(), 100);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(
            RatePolicy::new(0.0, 1.0),
            Err(LimiterError::InvalidCapacity(0.0))
        );
        assert_eq!(
            RatePolicy::new(10.0, -1.0),
            Err(LimiterError::InvalidRefillRate(-1.0))
        );
        assert!(matches!(
            RatePolicy::new(f64::NAN, 1.0),
            Err(LimiterError::InvalidCapacity(_))
        ));
        assert!(matches!(
            RatePolicy::new(5.0, f64::INFINITY),
            Err(LimiterError::InvalidRefillRate(_))
        ));
    }

    #[test]
    fn zero_limit_or_period_is_rejected() {
        assert_eq!(
            RatePolicy::per_period(0, Duration::from_secs(60)),
            Err(LimiterError::InvalidCapacity(0.0))
        );
        assert_eq!(
            RatePolicy::per_period(10, Duration::ZERO),
            Err(LimiterError::InvalidPeriod(0.0))
        );
    }

    #[test]
    fn cleanup_threshold_never_zero() {
        let policy = CleanupPolicy::new(Duration::from_secs(1), 0);
        assert_eq!(policy.sweep_threshold, 1);
        assert_eq!(CleanupPolicy::default().ttl, DEFAULT_BUCKET_TTL);
    }
}
