//! Core data types for the gateway filter contract.
//!
//! These types are shared by every [`GatewayFilter`](super::filter::GatewayFilter)
//! and carry no runtime dependencies beyond `serde` and `std`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering the standard verbs used in REST and proxy scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// Transport-neutral view of an inbound request.
///
/// Only the parts the filters need are captured; the body stays with the
/// transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Unique identifier for correlating this request across logs.
    pub id: String,
    /// Request path, e.g. `/health`.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// HTTP headers (header names are lowercased).
    pub headers: HashMap<String, String>,
    /// Address of the directly connected peer, when the transport knows it.
    pub peer_addr: Option<String>,
}

impl GatewayRequest {
    /// Construct a minimal request with the given id, path, and method.
    pub fn new(id: impl Into<String>, path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            method,
            headers: HashMap::new(),
            peer_addr: None,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: record the peer address.
    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    /// Header lookup by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(String::as_str)
    }
}

/// Response metadata passed back through the filter chain.
///
/// Filters annotate `headers`; the transport layer merges them into the real
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// HTTP status code produced by the inner handler.
    pub status: u16,
    /// Headers to add to the outgoing response.
    pub headers: HashMap<String, String>,
    /// Time from arrival to the end of the inner handler, in milliseconds.
    pub latency_ms: u64,
}

impl GatewayResponse {
    /// Construct a response with no extra headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            latency_ms: 0,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Rate-limit subject resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque identifier handed to the limiter (e.g. `ip:10.0.0.7`).
    pub key: String,
    /// Whether the caller presented a recognised credential.
    pub authenticated: bool,
}

impl Identity {
    pub fn anonymous(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            authenticated: false,
        }
    }

    pub fn authenticated(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            authenticated: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable context that flows through the filter chain for a single request.
///
/// Filters read from and write to this context, enabling downstream filters
/// to access decisions made by upstream filters (e.g. the identity set by the
/// identity filter is read by the rate limiter and the access logger).
#[derive(Debug, Clone)]
pub struct GatewayContext {
    /// The inbound request.
    pub request: GatewayRequest,
    /// Rate-limit subject; `None` until the identity filter has run.
    pub identity: Option<Identity>,
    /// Free-form attributes written and read by filters.
    pub attributes: HashMap<String, serde_json::Value>,
    /// Monotonic arrival time, the base for latency measurements.
    pub received_at: Instant,
}

impl GatewayContext {
    /// Create a fresh context from an inbound request.
    pub fn new(request: GatewayRequest) -> Self {
        Self {
            request,
            identity: None,
            attributes: HashMap::new(),
            received_at: Instant::now(),
        }
    }

    /// Convenience: read a typed attribute, returning `None` if absent or
    /// if deserialization fails.
    pub fn get_attr<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Convenience: write a serializable attribute.
    pub fn set_attr<T: serde::Serialize>(&mut self, key: impl Into<String>, val: &T) {
        if let Ok(v) = serde_json::to_value(val) {
            self.attributes.insert(key.into(), v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let req = GatewayRequest::new("r1", "/health", HttpMethod::Get)
            .with_header("X-Forwarded-For", "10.0.0.1");
        assert_eq!(req.header("x-forwarded-for"), Some("10.0.0.1"));
        assert_eq!(req.header("X-FORWARDED-FOR"), Some("10.0.0.1"));
    }

    #[test]
    fn attributes_round_trip_typed_values() {
        let mut ctx = GatewayContext::new(GatewayRequest::new("r1", "/", HttpMethod::Get));
        ctx.set_attr("ratelimit.limit", &100u64);
        assert_eq!(ctx.get_attr::<u64>("ratelimit.limit"), Some(100));
        assert_eq!(ctx.get_attr::<String>("ratelimit.limit"), None);
    }

    #[test]
    fn method_parse_ignores_case() {
        assert_eq!(HttpMethod::from_str_ci("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_str_ci("TRACE"), None);
    }
}
