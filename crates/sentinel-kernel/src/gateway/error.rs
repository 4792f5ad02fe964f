//! Errors raised by gateway filters.
//!
//! A filter returning `Err` means the gateway itself is broken (bad policy,
//! failed invariant), not that the caller misbehaved. Caller-facing outcomes
//! such as a throttled request are expressed as a
//! [`FilterAction`](super::filter::FilterAction) instead.

use crate::limiter::LimiterError;
use thiserror::Error;

/// Error type for the gateway filter contract.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum GatewayError {
    /// The rate limiter was called with an invalid policy.
    #[error("rate limiter misconfigured: {0}")]
    Limiter(#[from] LimiterError),

    /// A filter depends on context populated by an earlier filter that did not run.
    #[error("filter '{0}' requires a resolved identity")]
    MissingIdentity(String),
}
