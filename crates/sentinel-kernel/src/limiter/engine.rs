//! The shared token-bucket engine.
//!
//! A single [`TokenBucketEngine`] serves every policy tier: capacity and
//! refill rate arrive with each call, so the same instance can throttle
//! anonymous and authenticated callers side by side. Callers must scope their
//! identifiers so one identifier is only ever checked against one tier.
//!
//! ```
//! use sentinel_kernel::limiter::TokenBucketEngine;
//!
//! let engine = TokenBucketEngine::new();
//! let first = engine.allow_request("user_2", 2.0, 1.0, 1).unwrap();
//! assert!(first.allowed);
//! assert_eq!(first.remaining, 1);
//! ```

use super::bucket::{BucketState, Decision};
use super::error::LimiterResult;
use super::policy::{
    validate_capacity, validate_cost, validate_refill_rate, CleanupPolicy, RatePolicy,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Buckets plus the call counter driving the lazy sweep.
#[derive(Debug, Default)]
struct BucketStore {
    buckets: HashMap<String, BucketState>,
    calls_since_sweep: u64,
}

impl BucketStore {
    fn sweep(&mut self, now: Instant, cleanup: &CleanupPolicy) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| !bucket.is_stale(now, cleanup.ttl));
        self.calls_since_sweep = 0;
        before - self.buckets.len()
    }
}

/// In-process token-bucket engine keyed by opaque identifier.
///
/// All state sits behind one mutex. The critical section is a map lookup and
/// a handful of float operations; nothing inside it blocks or awaits.
#[derive(Debug)]
pub struct TokenBucketEngine {
    store: Mutex<BucketStore>,
    cleanup: CleanupPolicy,
}

impl TokenBucketEngine {
    /// Engine with the default cleanup policy (300 s TTL, sweep every 1000 calls).
    pub fn new() -> Self {
        Self::with_cleanup(CleanupPolicy::default())
    }

    pub fn with_cleanup(cleanup: CleanupPolicy) -> Self {
        Self {
            store: Mutex::new(BucketStore::default()),
            cleanup,
        }
    }

    pub fn cleanup_policy(&self) -> CleanupPolicy {
        self.cleanup
    }

    /// Admit or deny a request costing `cost` tokens for `identifier`.
    ///
    /// Unknown identifiers start with a full bucket. A denied request does
    /// not consume anything. Invalid `capacity`, `refill_rate` or `cost`
    /// values are returned as errors before any state changes.
    pub fn allow_request(
        &self,
        identifier: &str,
        capacity: f64,
        refill_rate: f64,
        cost: u32,
    ) -> LimiterResult<Decision> {
        self.allow_request_at(identifier, capacity, refill_rate, cost, Instant::now())
    }

    /// [`allow_request`](Self::allow_request) against an explicit clock reading.
    pub fn allow_request_at(
        &self,
        identifier: &str,
        capacity: f64,
        refill_rate: f64,
        cost: u32,
        now: Instant,
    ) -> LimiterResult<Decision> {
        validate_capacity(capacity)?;
        validate_refill_rate(refill_rate)?;
        validate_cost(cost)?;
        Ok(self.admit(identifier, capacity, refill_rate, cost, now))
    }

    /// Admit or deny using a pre-validated policy.
    pub fn check(&self, identifier: &str, policy: &RatePolicy, cost: u32) -> LimiterResult<Decision> {
        self.check_at(identifier, policy, cost, Instant::now())
    }

    pub fn check_at(
        &self,
        identifier: &str,
        policy: &RatePolicy,
        cost: u32,
        now: Instant,
    ) -> LimiterResult<Decision> {
        validate_cost(cost)?;
        Ok(self.admit(
            identifier,
            policy.capacity(),
            policy.refill_rate(),
            cost,
            now,
        ))
    }

    fn admit(
        &self,
        identifier: &str,
        capacity: f64,
        refill_rate: f64,
        cost: u32,
        now: Instant,
    ) -> Decision {
        let mut store = self.store.lock();

        store.calls_since_sweep += 1;
        if store.calls_since_sweep >= self.cleanup.sweep_threshold {
            let evicted = store.sweep(now, &self.cleanup);
            debug!(
                evicted,
                remaining = store.buckets.len(),
                "swept stale rate-limit buckets"
            );
        }

        let bucket = store
            .buckets
            .entry(identifier.to_owned())
            .or_insert_with(|| BucketState::new(capacity, now));
        bucket.refill(capacity, refill_rate, now);
        bucket.try_consume(f64::from(cost), refill_rate)
    }

    /// Evict every bucket idle for longer than the TTL, regardless of the
    /// call counter. Returns the number of evicted buckets.
    pub fn sweep_stale(&self) -> usize {
        self.sweep_stale_at(Instant::now())
    }

    pub fn sweep_stale_at(&self, now: Instant) -> usize {
        let mut store = self.store.lock();
        store.sweep(now, &self.cleanup)
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.store.lock().buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.store.lock().buckets.contains_key(identifier)
    }

    /// Balance recorded at the last update of `identifier`, without refilling.
    pub fn tokens(&self, identifier: &str) -> Option<f64> {
        self.store
            .lock()
            .buckets
            .get(identifier)
            .map(|bucket| bucket.tokens)
    }
}

impl Default for TokenBucketEngine {
    fn default() -> Self {
        Self::new()
    }
}
