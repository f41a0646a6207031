//! Postgres-backed invoice store.

use crate::models::{Invoice, InvoiceChanges, InvoiceListRow, NewInvoice};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Persistence seam for the invoice actions. Production wires [`Database`];
/// tests wire an in-memory double.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError>;
    async fn update_invoice(
        &self,
        id: Uuid,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError>;
    async fn delete_invoice(&self, id: Uuid) -> Result<bool, AppError>;
    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError>;
    async fn list_invoices(&self) -> Result<Vec<InvoiceListRow>, AppError>;
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    /// Check database health.
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Insert a new invoice row. Each statement is a single autocommitted unit.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (id, customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_id, amount, status, date
            "#,
        )
        .bind(id)
        .bind(&input.customer_id)
        .bind(input.amount_cents)
        .bind(input.status.as_str())
        .bind(input.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!(
                    "Customer '{}' does not exist",
                    input.customer_id
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice.id, "Invoice row inserted");

        Ok(invoice)
    }

    /// Update customer, amount, and status of the row matching `id`.
    /// `date` is deliberately absent from the SET list.
    #[instrument(skip(self, changes), fields(invoice_id = %id))]
    async fn update_invoice(
        &self,
        id: Uuid,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET customer_id = $2, amount = $3, status = $4
            WHERE id = $1
            RETURNING id, customer_id, amount, status, date
            "#,
        )
        .bind(id)
        .bind(&changes.customer_id)
        .bind(changes.amount_cents)
        .bind(changes.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!(
                    "Customer '{}' does not exist",
                    changes.customer_id
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)),
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// Delete the row matching `id`. Returns whether a row was removed.
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete_invoice(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    /// Get an invoice by id.
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, customer_id, amount, status, date
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List invoices joined with their customer, newest first.
    #[instrument(skip(self))]
    async fn list_invoices(&self) -> Result<Vec<InvoiceListRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let rows = sqlx::query_as::<_, InvoiceListRow>(
            r#"
            SELECT i.id, i.customer_id, c.name AS customer_name, i.amount, i.status, i.date
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            ORDER BY i.date DESC, i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(rows)
    }
}
