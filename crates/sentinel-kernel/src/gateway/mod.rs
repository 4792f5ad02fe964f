//! Gateway filter contract.
//!
//! This module defines the *trait interface and data types* shared by the
//! admission pipeline.  Concrete filters live in `sentinel-gateway`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              sentinel-kernel  (this module)                 │
//! │  GatewayFilter trait   FilterAction / FilterOrder           │
//! │  GatewayRequest/Response/Context  Identity  GatewayError    │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              sentinel-gateway  (runtime crate)              │
//! │  IdentityFilter / RateLimitFilter / LoggingFilter           │
//! │  FilterPipeline  GatewayServer (axum)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod filter;
pub mod types;

pub use error::GatewayError;
pub use filter::{FilterAction, FilterOrder, GatewayFilter};
pub use types::{GatewayContext, GatewayRequest, GatewayResponse, HttpMethod, Identity};
