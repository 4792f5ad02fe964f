//! Token-bucket rate limiting.
//!
//! ```text
//!   allow_request(id, capacity, refill_rate, cost)
//!        │
//!        ▼
//!   ┌──────────── store lock ─────────────┐
//!   │ tick sweep counter (sweep if due)   │
//!   │ lookup / create full bucket         │
//!   │ refill by elapsed × rate, clamp     │
//!   │ deduct cost or compute retry_after  │
//!   └─────────────────────────────────────┘
//!        │
//!        ▼
//!   Decision { allowed, remaining, retry_after }
//! ```

mod bucket;
mod engine;
mod error;
mod policy;

pub use bucket::Decision;
pub use engine::TokenBucketEngine;
pub use error::{LimiterError, LimiterResult};
pub use policy::{
    CleanupPolicy, RatePolicy, DEFAULT_BUCKET_TTL, DEFAULT_COST, DEFAULT_SWEEP_THRESHOLD,
};

#[cfg(test)]
mod proptests;
