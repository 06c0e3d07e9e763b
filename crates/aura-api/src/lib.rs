//! Axum HTTP API server.
//!
//! This crate provides:
//! - Briefing, narration and video generation endpoints
//! - A server-sent progress stream keyed by client tokens
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{Caller, ProgressToken};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
