//! HTTP handlers for the invoice dashboard routes.

use crate::actions::{ActionOutcome, INVOICES_PATH};
use crate::dtos::InvoiceForm;
use crate::services::metrics::VIEW_CACHE_LOOKUPS_TOTAL;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

fn mutation_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Redirect { location } => Redirect::to(location).into_response(),
        ActionOutcome::Refreshed => StatusCode::NO_CONTENT.into_response(),
        ActionOutcome::Rejected(state) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response()
        }
    }
}

/// POST /dashboard/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, AppError> {
    let outcome = state.actions.create_invoice(&form).await?;
    Ok(mutation_response(outcome))
}

/// POST /dashboard/invoices/{id}
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, AppError> {
    let outcome = state.actions.update_invoice(id, &form).await?;
    Ok(mutation_response(outcome))
}

/// DELETE /dashboard/invoices/{id}
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = state.actions.delete_invoice(id).await?;
    Ok(mutation_response(outcome))
}

/// GET /dashboard/invoices — served from the view cache until a mutation
/// invalidates it. The generation observed before the store read guards the
/// write-back: a body rendered before a concurrent invalidation is dropped
/// rather than cached stale.
pub async fn list_invoices(State(state): State<AppState>) -> Result<Response, AppError> {
    let generation = state.cache.generation(INVOICES_PATH).await;
    if let Some(body) = state.cache.get(INVOICES_PATH).await {
        VIEW_CACHE_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
        return Ok(Json(body).into_response());
    }
    VIEW_CACHE_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();

    let rows = state.store.list_invoices().await?;
    let body = serde_json::to_value(&rows)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render list: {}", e)))?;
    state.cache.put(INVOICES_PATH, generation, body.clone()).await;

    Ok(Json(body).into_response())
}

/// GET /dashboard/invoices/{id} — amount is rendered back as decimal
/// dollars for form prefill.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let invoice = state
        .store
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;

    let amount_dollars = Decimal::new(invoice.amount, 2);
    Ok(Json(serde_json::json!({
        "id": invoice.id,
        "customerId": invoice.customer_id,
        "amount": amount_dollars,
        "status": invoice.status,
        "date": invoice.date,
    }))
    .into_response())
}
