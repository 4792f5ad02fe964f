//! Limiter error types.
//!
//! Every variant is a caller-programming error: a policy value that can never
//! produce a meaningful admission decision. They are detected before any
//! bucket state is touched.

use thiserror::Error;

/// Invalid policy parameters passed to the token-bucket engine.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum LimiterError {
    /// Capacity is zero, negative, NaN or infinite.
    #[error("bucket capacity must be a positive finite number, got {0}")]
    InvalidCapacity(f64),

    /// Refill rate is zero, negative, NaN or infinite.
    #[error("refill rate must be a positive finite number of tokens per second, got {0}")]
    InvalidRefillRate(f64),

    /// Request cost is zero.
    #[error("request cost must be at least 1 token")]
    InvalidCost,

    /// The period used to derive a refill rate is zero or not finite.
    #[error("rate period must be a positive duration, got {0}s")]
    InvalidPeriod(f64),
}

/// Result alias for limiter operations.
pub type LimiterResult<T> = Result<T, LimiterError>;
