//! Tier selection: maps "is the caller authenticated" to a rate policy.

use crate::settings::Settings;
use sentinel_kernel::limiter::{LimiterResult, RatePolicy};
use serde_json::{json, Value};

/// The two policy tiers served by one engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPolicy {
    anonymous: RatePolicy,
    authenticated: RatePolicy,
}

impl TierPolicy {
    pub fn new(anonymous: RatePolicy, authenticated: RatePolicy) -> Self {
        Self {
            anonymous,
            authenticated,
        }
    }

    /// `DEFAULT_LIMIT` and `USER_LIMIT` tokens per `DEFAULT_PERIOD`.
    pub fn from_settings(settings: &Settings) -> LimiterResult<Self> {
        let period = settings.period();
        Ok(Self::new(
            RatePolicy::per_period(settings.default_limit, period)?,
            RatePolicy::per_period(settings.user_limit, period)?,
        ))
    }

    pub fn select(&self, authenticated: bool) -> &RatePolicy {
        if authenticated {
            &self.authenticated
        } else {
            &self.anonymous
        }
    }

    /// JSON summary for the status endpoint.
    pub fn describe(&self) -> Value {
        let tier = |p: &RatePolicy| {
            json!({
                "limit": p.limit(),
                "refill_per_second": p.refill_rate(),
            })
        };
        json!({
            "anonymous": tier(&self.anonymous),
            "authenticated": tier(&self.authenticated),
        })
    }
}
