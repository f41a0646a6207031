use invoice_service::{
    build_router,
    config::InvoiceConfig,
    services::{Database, InMemoryViewCache, InvoiceStore},
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = InvoiceConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    // Initialize metrics
    invoice_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting invoice service"
    );

    // Initialize database connection
    tracing::info!("Initializing database connection");
    let db = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized successfully");

    let store: Arc<dyn InvoiceStore> = Arc::new(db);
    let cache = Arc::new(InMemoryViewCache::default());
    let state = AppState::new(config.clone(), store, cache);

    // Build application router
    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
