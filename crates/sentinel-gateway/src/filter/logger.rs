//! Access-log filter.
//!
//! Runs after admission, so every line it writes belongs to a request that
//! reached the inner handler. Throttled requests are logged by the rate-limit
//! filter instead. Latency is measured from [`GatewayContext::received_at`].

use async_trait::async_trait;
use sentinel_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Logs admitted requests and stamps `latency_ms` on their responses.
#[derive(Default)]
pub struct LoggingFilter;

impl LoggingFilter {
    pub fn new() -> Self {
        Self
    }
}

fn caller(ctx: &GatewayContext) -> (&str, bool) {
    ctx.identity
        .as_ref()
        .map_or(("-", false), |id| (id.key.as_str(), id.authenticated))
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl GatewayFilter for LoggingFilter {
    fn name(&self) -> &str {
        "access-log"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::LOGGING
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let (identity, authenticated) = caller(ctx);
        debug!(
            request_id = %ctx.request.id,
            method = ctx.request.method.as_str(),
            path = %ctx.request.path,
            identity,
            authenticated,
            "request admitted"
        );
        Ok(FilterAction::Continue)
    }

    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        resp.latency_ms = millis(ctx.received_at.elapsed());
        let (identity, authenticated) = caller(ctx);

        match resp.status {
            500..=u16::MAX => error!(
                request_id = %ctx.request.id,
                method = ctx.request.method.as_str(),
                path = %ctx.request.path,
                identity,
                status = resp.status,
                latency_ms = resp.latency_ms,
                "handler failed"
            ),
            400..=499 => warn!(
                request_id = %ctx.request.id,
                method = ctx.request.method.as_str(),
                path = %ctx.request.path,
                identity,
                status = resp.status,
                latency_ms = resp.latency_ms,
                "client error"
            ),
            _ => info!(
                request_id = %ctx.request.id,
                method = ctx.request.method.as_str(),
                path = %ctx.request.path,
                identity,
                authenticated,
                status = resp.status,
                latency_ms = resp.latency_ms,
                "request served"
            ),
        }
        Ok(())
    }
}
