//! Axum HTTP API server.
//!
//! This crate provides:
//! - The profile update approval workflow over the store contracts
//! - Student, teacher, and admin REST surfaces
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ApprovalWorkflow, DirectoryGate, ReviewPolicy};
pub use state::AppState;
