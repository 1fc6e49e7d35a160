//! HTTP API module for the salary tax engine.
//!
//! This module provides the REST API endpoints for comparing tax regimes
//! for a compensation profile.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::CompareRequest;
pub use response::{ApiError, ApiErrorResponse, ComparisonResponse, HealthResponse};
pub use state::AppState;
