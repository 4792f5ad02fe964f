//! `sentinel-kernel`: token-bucket engine and gateway contracts.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`limiter`] | [`TokenBucketEngine`](limiter::TokenBucketEngine), policies, decisions |
//! | [`gateway`] | filter trait, request/response/context types |
//! | `config` | multi-format configuration loader (feature `config`) |
//! | [`error`] | crate-level error |

// limiter module
pub mod limiter;

// gateway contract
pub mod gateway;

// config module
#[cfg(feature = "config")]
pub mod config;

// error module
pub mod error;
