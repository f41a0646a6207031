//! HTTP handlers for invoice-service.

pub mod invoices;

use crate::services::metrics;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use service_core::error::AppError;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.store.ping().await?;
    Ok("ok")
}

/// GET /metrics
pub async fn metrics_text() -> impl IntoResponse {
    metrics::get_metrics()
}
