//! Crate-level error types for `sentinel-kernel`.
//!
//! [`KernelError`] composes the errors of every sub-module and pairs with
//! [`error_stack::Report`] for context-carrying propagation on startup paths.
//!
//! ```rust,ignore
//! use sentinel_kernel::error::{KernelError, KernelResult};
//! use error_stack::{Report, ResultExt};
//!
//! fn tier() -> KernelResult<RatePolicy> {
//!     RatePolicy::per_period(limit, period)
//!         .map_err(KernelError::from)
//!         .map_err(Report::new)
//!         .attach("building the anonymous tier")
//! }
//! ```

use crate::gateway::GatewayError;
use crate::limiter::LimiterError;
use thiserror::Error;

/// Crate-level error type for `sentinel-kernel`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// Invalid rate policy.
    #[error("Limiter error: {0}")]
    Limiter(#[from] LimiterError),

    /// A gateway filter failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A configuration-related error (requires the `config` feature).
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal / untyped error described by a message string.
    #[error("{0}")]
    Internal(String),
}

/// Convenience result alias using [`error_stack::Report`].
pub type KernelResult<T> = Result<T, error_stack::Report<KernelError>>;

#[cfg(test)]
mod tests {
    use super::*;
    use error_stack::{Report, ResultExt};

    #[test]
    fn limiter_error_converts_via_from() {
        let kernel_err: KernelError = LimiterError::InvalidCost.into();
        assert!(matches!(kernel_err, KernelError::Limiter(_)));
        assert!(kernel_err.to_string().contains("at least 1 token"));
    }

    #[test]
    fn gateway_error_converts_via_from() {
        let kernel_err: KernelError = GatewayError::MissingIdentity("rate-limit".into()).into();
        assert!(matches!(kernel_err, KernelError::Gateway(_)));
        assert!(kernel_err.to_string().contains("rate-limit"));
    }

    #[test]
    fn report_carries_context() {
        let result: KernelResult<()> =
            Err(Report::new(KernelError::Internal("root cause".into())))
                .attach("while building rate tiers");

        let display = format!("{:?}", result.unwrap_err());
        assert!(display.contains("root cause"));
        assert!(display.contains("while building rate tiers"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn config_error_converts_via_from() {
        let cfg_err = crate::config::ConfigError::UnsupportedFormat("xml".to_string());
        let kernel_err: KernelError = cfg_err.into();
        assert!(matches!(kernel_err, KernelError::Config(_)));
        assert!(kernel_err.to_string().contains("xml"));
    }
}
