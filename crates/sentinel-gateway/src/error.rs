//! Gateway error types

use crate::filter::{LIMIT_HEADER, REMAINING_HEADER};
use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use sentinel_kernel::gateway::GatewayError as FilterError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded, retry after {retry_after:.3}s")]
    RateLimited {
        retry_after: f64,
        limit: u64,
        remaining: u64,
    },

    #[error("request rejected: {message}")]
    Rejected { status: u16, message: String },

    #[error("method '{0}' is not supported")]
    UnsupportedMethod(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::RateLimited {
            retry_after,
            limit,
            remaining,
        } = self
        {
            return throttled(retry_after, limit, remaining);
        }

        let (status, code, message) = match &self {
            GatewayError::Rejected { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::FORBIDDEN),
                "REQUEST_REJECTED",
                message.clone(),
            ),
            GatewayError::UnsupportedMethod(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                self.to_string(),
            ),
            GatewayError::Filter(FilterError::Limiter(err)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RATE_LIMIT_MISCONFIGURED",
                err.to_string(),
            ),
            GatewayError::Filter(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "FILTER_FAILED",
                err.to_string(),
            ),
            GatewayError::Internal(_) | GatewayError::RateLimited { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

fn throttled(retry_after: f64, limit: u64, remaining: u64) -> Response {
    // JSON has no infinity; serde_json would write null.
    let retry_after = if retry_after.is_finite() {
        retry_after
    } else {
        f64::MAX
    };
    let retry_secs = (retry_after.ceil() as u64).max(1);
    let body = Json(json!({
        "error": "Too Many Requests",
        "detail": "Rate limit exceeded. Slow down.",
        "retry_after": retry_after,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_secs));
    headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(limit));
    headers.insert(
        HeaderName::from_static(REMAINING_HEADER),
        HeaderValue::from(remaining),
    );
    response
}
