//! invoice-service: validated invoice mutations for the dashboard.

pub mod actions;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use crate::actions::InvoiceActions;
use crate::config::InvoiceConfig;
use crate::services::{InvoiceStore, ViewCache};
use service_core::axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: InvoiceConfig,
    pub store: Arc<dyn InvoiceStore>,
    pub cache: Arc<dyn ViewCache>,
    pub actions: InvoiceActions,
}

impl AppState {
    pub fn new(
        config: InvoiceConfig,
        store: Arc<dyn InvoiceStore>,
        cache: Arc<dyn ViewCache>,
    ) -> Self {
        let actions = InvoiceActions::new(
            store.clone(),
            cache.clone(),
            config.legacy_delete_failure,
        );
        Self {
            config,
            store,
            cache,
            actions,
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_text))
        .route(
            "/dashboard/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/dashboard/invoices/:id",
            get(handlers::invoices::get_invoice)
                .post(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
