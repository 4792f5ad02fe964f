//! Gateway filter trait and filter ordering.
//!
//! A filter chain is an ordered list of [`GatewayFilter`] instances applied
//! to every request and response.  Filters are sorted by their declared
//! [`FilterOrder`] and executed in ascending order on the request path
//! (lowest value first) and descending order on the response path.
//!
//! ```text
//! Request  ──► Identity ──► RateLimit ──► Logging
//!                  (inner handler runs here)
//! Response ◄── Logging ◄── RateLimit ◄── Identity
//! ```

use super::error::GatewayError;
use super::types::{GatewayContext, GatewayResponse};
use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Filter ordering
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric ordering slot for a filter in the chain.
///
/// The well-known slots below act as guidelines; any `u32` value is accepted
/// so implementors can slot in custom filters between the standard phases.
/// Filters with equal order values are executed in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    /// Identity resolution slot (peer address, API key).
    pub const IDENTITY: FilterOrder = FilterOrder(100);
    /// Rate-limiting / throttling slot.
    pub const RATE_LIMIT: FilterOrder = FilterOrder(200);
    /// Audit logging slot.
    pub const LOGGING: FilterOrder = FilterOrder(400);
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter action
// ─────────────────────────────────────────────────────────────────────────────

/// Instruction returned by [`GatewayFilter::on_request`] controlling what
/// the gateway does with the request after the filter runs.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FilterAction {
    /// Pass the request to the next filter or the inner handler.
    Continue,
    /// Short-circuit the chain and return a synthetic error response with the
    /// given HTTP status and body string.
    Reject(u16, String),
    /// Short-circuit with `429 Too Many Requests`.
    Throttle {
        /// Seconds until the request could be admitted.
        retry_after: f64,
        /// Advertised limit of the caller's tier.
        limit: u64,
        /// Whole tokens left.
        remaining: u64,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayFilter trait
// ─────────────────────────────────────────────────────────────────────────────

/// Contract for a single filter in the gateway pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Stable, human-readable identifier for this filter (used in logs).
    fn name(&self) -> &str;

    /// Position in the filter chain.  Lower values execute first on the
    /// request path.
    fn order(&self) -> FilterOrder;

    /// Called with the inbound request *before* it reaches the inner handler.
    ///
    /// Return [`FilterAction::Continue`] to proceed, or a `Reject`/`Throttle`
    /// variant to short-circuit the chain.
    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError>;

    /// Called with the handler's response *before* it is returned to the caller.
    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError>;
}
