//! Pricing route handlers.
//!
//! All endpoints accept and return JSON; calculation failures surface one
//! human-readable message plus structured detail for the administrator.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::AppState;

use super::requests::{BatchQuoteRequest, QuoteRequest};
use super::responses::PricingErrorResponse;
use super::services::{self, PricingError, USER_MESSAGE};

/// Build the pricing API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote))
        .route("/quote/batch", post(quote_batch))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/invalidate", post(cache_invalidate))
}

/// Single-tenant calculation
async fn quote(State(state): State<AppState>, Json(request): Json<QuoteRequest>) -> Response {
    match services::calculate_quote(&state.db, &state.cache, request.tenant_id, &request.input)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => pricing_error_response(err),
    }
}

/// Batch calculation across several tenants
async fn quote_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchQuoteRequest>,
) -> Response {
    let response = services::calculate_quote_batch(
        &state.db,
        &state.cache,
        &request.quote_input,
        &request.tenant_ids,
    )
    .await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Cache statistics for monitoring
async fn cache_stats(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.cache.stats())).into_response()
}

/// Flush cached config snapshots after the admin side edits tables
async fn cache_invalidate(State(state): State<AppState>) -> Response {
    state.cache.invalidate_all();
    StatusCode::NO_CONTENT.into_response()
}

fn pricing_error_response(err: PricingError) -> Response {
    let status = match &err {
        PricingError::Validation { .. } | PricingError::MissingConfiguration { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PricingError::Database(_) | PricingError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::debug!(error = %err, "quote request rejected");

    let body = PricingErrorResponse {
        error_type: err.error_type().to_string(),
        message: USER_MESSAGE.to_string(),
        details: err.details(),
    };
    (status, Json(body)).into_response()
}
