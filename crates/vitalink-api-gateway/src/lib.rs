//! Ingestion gateway HTTP surface.
//!
//! Stateless for PHI: verifies bearer tokens against the identity
//! authority's JWKS, enforces per-subject sliding-window rate limits and
//! idempotent delivery, normalizes vendor codings, forwards to the
//! clinical emitter and keeps a hash-only audit trail.

pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod services;

pub use context::AuthContext;
pub use error::GatewayError;
pub use rate_limit::SlidingWindowLimiter;
pub use router::{gateway_router, GatewayOptions, GatewayState};
