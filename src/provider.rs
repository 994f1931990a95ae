//! Provider-facing configuration (data) and strategies (behavior).
//!
//! `config` exposes the validated [`ClientConfig`] covering HTTPS-only endpoints, client
//! credentials, default scope, and audience, resolved from explicit settings layered over
//! process-wide defaults. `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic
//! hook used by flows to enrich outgoing token requests and classify provider errors.

pub mod config;
pub mod grant;
pub mod strategy;

pub use config::*;
pub use grant::*;
pub use strategy::*;
