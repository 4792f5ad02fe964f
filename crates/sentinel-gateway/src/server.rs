//! Axum-based admission gateway.
//!
//! [`GatewayServer`] wires the filter pipeline and the shared token-bucket
//! engine into an axum middleware, and wraps either its own status routes or
//! any caller-supplied [`Router`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check (rate limited like everything else). |
//! | `GET`  | `/v1/limits` | Tier policies and number of tracked buckets. |

use crate::error::GatewayError;
use crate::filter::{FilterPipeline, IdentityFilter, LoggingFilter, RateLimitFilter};
use crate::policy::TierPolicy;
use crate::settings::Settings;
use crate::sweeper::spawn_sweeper;
use axum::{
    Json, Router,
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use error_stack::{Report, ResultExt};
use sentinel_kernel::error::{KernelError, KernelResult};
use sentinel_kernel::gateway::{
    FilterAction, GatewayContext, GatewayFilter, GatewayRequest, GatewayResponse, HttpMethod,
};
use sentinel_kernel::limiter::TokenBucketEngine;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into the admission middleware and status handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<FilterPipeline>,
    engine: Arc<TokenBucketEngine>,
    tiers: TierPolicy,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// Admission gateway: settings, tier policies and the engine they share.
pub struct GatewayServer {
    settings: Settings,
    tiers: TierPolicy,
    engine: Arc<TokenBucketEngine>,
}

impl GatewayServer {
    /// Validate the tier policies and create the engine.
    pub fn new(settings: Settings) -> KernelResult<Self> {
        let tiers = TierPolicy::from_settings(&settings)
            .map_err(KernelError::from)
            .map_err(Report::new)
            .attach("building rate tiers from settings")?;
        let engine = Arc::new(TokenBucketEngine::with_cleanup(settings.cleanup_policy()));
        Ok(Self {
            settings,
            tiers,
            engine,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The engine shared by every request this server admits.
    pub fn engine(&self) -> Arc<TokenBucketEngine> {
        Arc::clone(&self.engine)
    }

    fn state(&self) -> AppState {
        let filters: Vec<Arc<dyn GatewayFilter>> = vec![
            Arc::new(
                IdentityFilter::new(self.settings.api_keys.clone())
                    .trust_forwarded_for(self.settings.trust_forwarded_for),
            ),
            Arc::new(RateLimitFilter::new(self.engine(), self.tiers)),
            Arc::new(LoggingFilter::new()),
        ];

        AppState {
            pipeline: Arc::new(FilterPipeline::new(filters)),
            engine: self.engine(),
            tiers: self.tiers,
        }
    }

    /// Put `inner` behind the admission middleware.
    pub fn wrap(&self, inner: Router) -> Router {
        guard(inner, self.state())
    }

    /// The gateway's own routes, behind the admission middleware.
    pub fn build_app(&self) -> Router {
        let state = self.state();
        let status = Router::new()
            .route("/health", get(health_handler))
            .route("/v1/limits", get(limits_handler))
            .with_state(state.clone());
        guard(status, state)
    }

    /// Bind to the configured address and serve until the process exits.
    pub async fn start(self) -> std::io::Result<()> {
        let app = self.build_app();
        let addr = self.settings.bind_addr();

        // Held until serve returns; dropping it stops the task.
        let sweeper = self
            .settings
            .sweep_interval()
            .map(|every| spawn_sweeper(self.engine(), every));

        info!(
            addr = %addr,
            anonymous_limit = self.tiers.select(false).limit(),
            authenticated_limit = self.tiers.select(true).limit(),
            background_sweep = sweeper.is_some(),
            "Sentinel gateway starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admission middleware
// ─────────────────────────────────────────────────────────────────────────────

fn guard(inner: Router, state: AppState) -> Router {
    inner.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn_with_state(state, admission)),
    )
}

/// Run the filter pipeline, then either reject or forward and annotate.
async fn admission(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(method) = HttpMethod::from_str_ci(req.method().as_str()) else {
        return GatewayError::UnsupportedMethod(req.method().to_string()).into_response();
    };

    let mut ctx = GatewayContext::new(to_gateway_request(&req, method));

    match state.pipeline.run_request(&mut ctx).await {
        Ok(FilterAction::Throttle {
            retry_after,
            limit,
            remaining,
        }) => {
            return GatewayError::RateLimited {
                retry_after,
                limit,
                remaining,
            }
            .into_response();
        }
        Ok(FilterAction::Reject(status, message)) => {
            return GatewayError::Rejected { status, message }.into_response();
        }
        Ok(FilterAction::Continue) => {}
        // FilterAction is #[non_exhaustive]; treat unknown variants as Continue.
        Ok(_) => {}
        Err(err) => {
            warn!(request_id = %ctx.request.id, error = %err, "filter pipeline failed");
            return GatewayError::Filter(err).into_response();
        }
    }

    let mut response = next.run(req).await;

    let mut summary = GatewayResponse::new(response.status().as_u16());
    if let Err(err) = state.pipeline.run_response(&ctx, &mut summary).await {
        warn!(
            request_id = %ctx.request.id,
            error = %err,
            "response filter pipeline error (handler response still returned)"
        );
    }

    let headers = response.headers_mut();
    for (name, value) in &summary.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    response
}

fn to_gateway_request(req: &Request, method: HttpMethod) -> GatewayRequest {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut gw = GatewayRequest::new(request_id, req.uri().path(), method);
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            gw = gw.with_header(name.as_str(), v);
        }
    }
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        gw = gw.with_peer_addr(addr.ip().to_string());
    }
    gw
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "sentinel-gateway" }))
}

/// `GET /v1/limits`: tier policies and tracked bucket count.
async fn limits_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = state.tiers.describe();
    body["tracked_buckets"] = json!(state.engine.len());
    Json(body)
}
