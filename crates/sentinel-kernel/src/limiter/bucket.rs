//! Per-identifier bucket state and refill arithmetic.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Whole tokens left in the bucket after this call.
    pub remaining: u64,
    /// Seconds until enough tokens accrue for a denied request; `0.0` when allowed.
    pub retry_after: f64,
}

impl Decision {
    pub(crate) fn allow(remaining: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: 0.0,
        }
    }

    pub(crate) fn deny(remaining: u64, retry_after: f64) -> Self {
        Self {
            allowed: false,
            remaining,
            retry_after,
        }
    }

    /// `retry_after` as a [`Duration`], saturating at [`Duration::MAX`].
    pub fn retry_after_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_after.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// `retry_after` rounded up to whole seconds, for the `Retry-After` header.
    ///
    /// A denial always advertises at least one second.
    pub fn retry_after_secs(&self) -> u64 {
        if self.allowed {
            0
        } else {
            (self.retry_after.ceil() as u64).max(1)
        }
    }
}

/// Token balance of one identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BucketState {
    /// Current balance; within `[0, capacity]` right after an update.
    pub(crate) tokens: f64,
    /// Monotonic time of the last refill.
    pub(crate) last_updated: Instant,
}

impl BucketState {
    /// A full bucket.
    pub(crate) fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_updated: now,
        }
    }

    /// Credit tokens for the time elapsed since the last update and clamp to
    /// the capacity of the current call.
    ///
    /// An `now` earlier than `last_updated` counts as zero elapsed time and
    /// leaves the timestamp where it is.
    pub(crate) fn refill(&mut self, capacity: f64, refill_rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_updated);
        let refill = elapsed.as_secs_f64() * refill_rate;
        self.tokens = (self.tokens + refill).min(capacity).max(0.0);
        if now > self.last_updated {
            self.last_updated = now;
        }
    }

    /// Deduct `cost` if the balance covers it; otherwise leave the balance
    /// untouched and report how long the caller should wait.
    pub(crate) fn try_consume(&mut self, cost: f64, refill_rate: f64) -> Decision {
        if self.tokens >= cost {
            self.tokens -= cost;
            Decision::allow(self.remaining())
        } else {
            let needed = cost - self.tokens;
            Decision::deny(self.remaining(), needed / refill_rate)
        }
    }

    pub(crate) fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_updated) > ttl
    }

    fn remaining(&self) -> u64 {
        self.tokens.floor() as u64
    }
}
