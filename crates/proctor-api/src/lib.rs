//! Axum HTTP API server.
//!
//! This crate provides:
//! - The proctoring token protocol (`/capture`, `/validate-face`, browser events)
//! - Per-user violation ledger with a sticky termination threshold
//! - Exam result submission and listing
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{LedgerEntry, ProctorPipeline, ResultStore, ViolationLedger};
pub use state::AppState;
