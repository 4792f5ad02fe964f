//! `sentinel-gateway`: per-caller token-bucket admission for HTTP services.
//!
//! This crate provides the concrete implementations of the contracts defined
//! in `sentinel-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`GatewayFilter`](gateway::GatewayFilter) | [`filter::IdentityFilter`], [`filter::RateLimitFilter`], [`filter::LoggingFilter`] |
//! | [`TokenBucketEngine`](limiter::TokenBucketEngine) | shared by [`server::GatewayServer`] and [`sweeper::spawn_sweeper`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum
//! middleware that can guard any [`axum::Router`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use sentinel_gateway::server::GatewayServer;
//! use sentinel_gateway::settings::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let server = GatewayServer::new(Settings::default()).map_err(|r| format!("{r:?}"))?;
//! let app = server.wrap(Router::new().route("/", get(|| async { "Hello" })));
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod policy;
pub mod server;
pub mod settings;
pub mod sweeper;

// Re-export the kernel types for convenience.
pub use sentinel_kernel::{gateway, limiter};
