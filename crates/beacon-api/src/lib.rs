//! HTTP request surface for the Beacon relay.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Ingest** (`POST /api/notify`) -- validates a reported event,
//!   stores it, and hands it to the notification relay without waiting.
//! - **Query endpoints** (`/api/servers`, `/api/servers/filter`,
//!   `/api/servers/{jobId}`) -- read active records.
//! - **Delete** (`DELETE /api/servers/{jobId}`) -- remove records by job.
//! - **Stats** (`GET /api/stats`) -- store counters and uptime.
//! - **Health** (`GET /api/health`) -- unauthenticated liveness check.
//! - **Dashboard** (`GET /`) -- static HTML page polling the API.
//!
//! # Architecture
//!
//! Handlers share an [`AppState`] holding the [`RecordStore`], the
//! [`Notifier`], and the auth/rate-limit settings. All `/api` routes pass
//! through a per-client rate limiter; every route except health requires
//! the `X-API-Key` header.
//!
//! [`RecordStore`]: beacon_core::RecordStore
//! [`Notifier`]: beacon_relay::Notifier

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod rate_limit;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use auth::AuthConfig;
pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use state::AppState;
