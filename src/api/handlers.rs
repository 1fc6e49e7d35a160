//! HTTP request handlers for the salary tax engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::FiscalYear;

use super::request::CompareRequest;
use super::response::{ApiError, ApiErrorResponse, ComparisonResponse, HealthResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/compare", post(compare_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(api_error: ApiErrorResponse) -> Response {
    json_response(api_error.status, api_error.error)
}

/// Handler for POST /compare endpoint.
///
/// Accepts a profile and fiscal year and returns one result per regime plus
/// a recommendation.
async fn compare_handler(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing comparison request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return json_response(StatusCode::BAD_REQUEST, error);
        }
    };

    let fiscal_year = match FiscalYear::parse(&request.fiscal_year) {
        Ok(fy) => fy,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                fiscal_year = %request.fiscal_year,
                "Unrecognised fiscal year"
            );
            return error_response(err.into());
        }
    };

    let start_time = Instant::now();
    match state
        .engine()
        .compare(&request.profile, &fiscal_year, &request.regimes)
        .await
    {
        Ok(results) => {
            let response = ComparisonResponse::new(fiscal_year, results);
            info!(
                correlation_id = %correlation_id,
                calculation_id = %response.calculation_id,
                fiscal_year = %response.fiscal_year,
                regimes = response.results.len(),
                recommended = ?response.summary.as_ref().map(|s| s.recommended_regime),
                duration_us = start_time.elapsed().as_micros(),
                "Comparison completed successfully"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Comparison failed"
            );
            error_response(err.into())
        }
    }
}

/// Handler for GET /health endpoint.
async fn health_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            cached_fiscal_years: state.engine().repository().cached_years(),
        },
    )
}
