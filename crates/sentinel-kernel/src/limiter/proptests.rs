//! Property tests for the engine's admission accounting.

use super::{CleanupPolicy, TokenBucketEngine};
use proptest::prelude::*;
use std::time::{Duration, Instant};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Admitted cost never exceeds the initial burst plus what the elapsed
    /// time could have refilled.
    #[test]
    fn prop_no_over_admission(
        capacity in 1u32..50,
        refill_rate in 0.01f64..20.0,
        steps in prop::collection::vec((0u64..2_000, 1u32..5), 1..200),
    ) {
        let engine = TokenBucketEngine::new();
        let start = Instant::now();
        let mut now = start;
        let mut admitted = 0u64;

        for (advance_ms, cost) in steps {
            now += Duration::from_millis(advance_ms);
            let decision = engine
                .allow_request_at("prop", f64::from(capacity), refill_rate, cost, now)
                .unwrap();
            if decision.allowed {
                admitted += u64::from(cost);
            }
            let elapsed = now.duration_since(start).as_secs_f64();
            let ceiling = f64::from(capacity) + refill_rate * elapsed;
            prop_assert!(admitted as f64 <= ceiling + 1e-6);
        }
    }

    /// The balance always stays within `[0, capacity]` for the capacity of
    /// the latest call, even when the capacity changes between calls.
    #[test]
    fn prop_balance_stays_in_range(
        calls in prop::collection::vec((1u32..100, 0u64..500, 1u32..10), 1..100),
    ) {
        let engine = TokenBucketEngine::new();
        let mut now = Instant::now();

        for (capacity, advance_ms, cost) in calls {
            now += Duration::from_millis(advance_ms);
            engine
                .allow_request_at("range", f64::from(capacity), 3.0, cost, now)
                .unwrap();
            let tokens = engine.tokens("range").unwrap();
            prop_assert!(tokens >= 0.0);
            prop_assert!(tokens <= f64::from(capacity));
        }
    }

    /// A denied caller that waits `retry_after` is admitted with the same cost.
    #[test]
    fn prop_retry_after_is_sufficient(
        capacity in 1u32..20,
        refill_rate in 0.05f64..10.0,
        cost_seed in 1u32..20,
    ) {
        let cost = cost_seed.min(capacity);
        let engine = TokenBucketEngine::with_cleanup(CleanupPolicy::default());
        let start = Instant::now();
        engine
            .allow_request_at("retry", f64::from(capacity), refill_rate, capacity, start)
            .unwrap();

        let denied = engine
            .allow_request_at("retry", f64::from(capacity), refill_rate, cost, start)
            .unwrap();
        prop_assert!(!denied.allowed);

        let later = start + denied.retry_after_duration() + Duration::from_micros(10);
        let retried = engine
            .allow_request_at("retry", f64::from(capacity), refill_rate, cost, later)
            .unwrap();
        prop_assert!(retried.allowed);
    }
}
