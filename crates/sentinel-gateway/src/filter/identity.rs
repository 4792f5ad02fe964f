//! Identity resolution filter.
//!
//! Turns a request into the opaque key handed to the rate limiter:
//!
//! - a recognised credential in `X-Api-Key: <key>` or
//!   `Authorization: Bearer <key>` gives `key:<hash>` on the authenticated tier
//! - anything else is keyed by client address as `ip:<addr>`
//! - with no address at all the key is `ip:unknown`
//!
//! Unrecognised credentials are not rejected here; the caller simply stays on
//! the anonymous tier. The `key:`/`ip:` prefixes keep the two tiers'
//! identifiers disjoint.

use async_trait::async_trait;
use sentinel_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayRequest,
    GatewayResponse, Identity,
};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Key used when the transport cannot tell who is calling.
pub const UNKNOWN_CLIENT: &str = "ip:unknown";

/// Resolves the rate-limit subject of each request.
pub struct IdentityFilter {
    api_keys: HashSet<String>,
    trust_forwarded_for: bool,
}

impl IdentityFilter {
    pub fn new(api_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            api_keys: api_keys.into_iter().map(Into::into).collect(),
            trust_forwarded_for: false,
        }
    }

    /// Key anonymous callers by `X-Forwarded-For` / `X-Real-IP` when present.
    ///
    /// Only enable behind a proxy that overwrites these headers.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Resolve the identity of a request. Never fails.
    pub fn resolve(&self, request: &GatewayRequest) -> Identity {
        if let Some(credential) = Self::extract_credential(request) {
            if self.api_keys.contains(credential) {
                return Identity::authenticated(format!("key:{:016x}", fingerprint(credential)));
            }
            debug!(request_id = %request.id, "unrecognised credential, using anonymous tier");
        }

        match self.client_addr(request) {
            Some(addr) => Identity::anonymous(format!("ip:{addr}")),
            None => Identity::anonymous(UNKNOWN_CLIENT),
        }
    }

    fn extract_credential(request: &GatewayRequest) -> Option<&str> {
        let api_key = request
            .header("x-api-key")
            .map(str::trim)
            .filter(|k| !k.is_empty());
        api_key.or_else(|| {
            request
                .header("authorization")
                .and_then(bearer_token)
                .filter(|k| !k.is_empty())
        })
    }

    fn client_addr<'a>(&self, request: &'a GatewayRequest) -> Option<&'a str> {
        if self.trust_forwarded_for {
            let forwarded = request
                .header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .or_else(|| request.header("x-real-ip"))
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if forwarded.is_some() {
                return forwarded;
            }
        }
        request.peer_addr.as_deref().filter(|v| !v.is_empty())
    }
}

/// Token of an `Authorization` value; the scheme is matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

/// Stable per-process fingerprint so raw credentials never reach logs or the store.
fn fingerprint(credential: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    credential.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl GatewayFilter for IdentityFilter {
    fn name(&self) -> &str {
        "identity"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::IDENTITY
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let identity = self.resolve(&ctx.request);
        debug!(
            request_id = %ctx.request.id,
            identity = %identity.key,
            authenticated = identity.authenticated,
            "resolved caller identity"
        );
        ctx.identity = Some(identity);
        Ok(FilterAction::Continue)
    }

    async fn on_response(
        &self,
        _ctx: &GatewayContext,
        _resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}
