//! Token-bucket admission filter.
//!
//! Each resolved identity is checked against the shared
//! [`TokenBucketEngine`] under the policy of its tier. Denied requests are
//! short-circuited with [`FilterAction::Throttle`]; admitted responses are
//! annotated with `x-ratelimit-limit` and `x-ratelimit-remaining`.

use crate::policy::TierPolicy;
use async_trait::async_trait;
use sentinel_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
};
use sentinel_kernel::limiter::{DEFAULT_COST, TokenBucketEngine};
use std::sync::Arc;
use tracing::warn;

const LIMIT_ATTR: &str = "ratelimit.limit";
const REMAINING_ATTR: &str = "ratelimit.remaining";

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Rate-limit filter backed by a shared engine.
pub struct RateLimitFilter {
    engine: Arc<TokenBucketEngine>,
    tiers: TierPolicy,
    cost: u32,
}

impl RateLimitFilter {
    pub fn new(engine: Arc<TokenBucketEngine>, tiers: TierPolicy) -> Self {
        Self {
            engine,
            tiers,
            cost: DEFAULT_COST,
        }
    }

    /// Tokens charged per request.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }
}

#[async_trait]
impl GatewayFilter for RateLimitFilter {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::RATE_LIMIT
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let identity = ctx
            .identity
            .clone()
            .ok_or_else(|| GatewayError::MissingIdentity(self.name().to_string()))?;
        let policy = self.tiers.select(identity.authenticated);
        let decision = self.engine.check(&identity.key, policy, self.cost)?;

        ctx.set_attr(LIMIT_ATTR, &policy.limit());
        ctx.set_attr(REMAINING_ATTR, &decision.remaining);

        if decision.allowed {
            return Ok(FilterAction::Continue);
        }

        warn!(
            request_id = %ctx.request.id,
            identity = %identity.key,
            authenticated = identity.authenticated,
            retry_after = decision.retry_after,
            "rate limit exceeded"
        );
        Ok(FilterAction::Throttle {
            retry_after: decision.retry_after,
            limit: policy.limit(),
            remaining: decision.remaining,
        })
    }

    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        if let Some(limit) = ctx.get_attr::<u64>(LIMIT_ATTR) {
            resp.headers.insert(LIMIT_HEADER.to_string(), limit.to_string());
        }
        if let Some(remaining) = ctx.get_attr::<u64>(REMAINING_ATTR) {
            resp.headers
                .insert(REMAINING_HEADER.to_string(), remaining.to_string());
        }
        Ok(())
    }
}
