//! Shared test doubles for invoice-service tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use invoice_service::config::{DatabaseConfig, Environment, InvoiceConfig};
use invoice_service::models::{Invoice, InvoiceChanges, InvoiceListRow, NewInvoice};
use invoice_service::services::{InvoiceStore, ViewCache};
use invoice_service::AppState;
use serde_json::Value;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory invoice store double with a seeded customer table, so foreign
/// key behavior matches the real store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Invoice>>,
    customers: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn seed_customer(&self, id: &str, name: &str) {
        self.customers
            .lock()
            .unwrap()
            .insert(id.to_string(), name.to_string());
    }

    /// Seed an invoice row directly, bypassing the actions.
    pub fn seed_invoice(&self, invoice: Invoice) {
        self.rows.lock().unwrap().push(invoice);
    }

    pub fn row(&self, id: Uuid) -> Option<Invoice> {
        self.rows.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows_snapshot(&self) -> Vec<Invoice> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        if !self
            .customers
            .lock()
            .unwrap()
            .contains_key(&input.customer_id)
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Customer '{}' does not exist",
                input.customer_id
            )));
        }
        let invoice = Invoice {
            id: Uuid::new_v4(),
            customer_id: input.customer_id.clone(),
            amount: input.amount_cents,
            status: input.status.as_str().to_string(),
            date: input.date,
        };
        self.rows.lock().unwrap().push(invoice.clone());
        Ok(invoice)
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError> {
        if !self
            .customers
            .lock()
            .unwrap()
            .contains_key(&changes.customer_id)
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Customer '{}' does not exist",
                changes.customer_id
            )));
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(invoice) = rows.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        invoice.customer_id = changes.customer_id.clone();
        invoice.amount = changes.amount_cents;
        invoice.status = changes.status.as_str().to_string();
        Ok(Some(invoice.clone()))
    }

    async fn delete_invoice(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.id != id);
        Ok(rows.len() < before)
    }

    async fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.row(id))
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceListRow>, AppError> {
        let customers = self.customers.lock().unwrap().clone();
        let mut rows: Vec<InvoiceListRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|i| InvoiceListRow {
                id: i.id,
                customer_id: i.customer_id.clone(),
                customer_name: customers
                    .get(&i.customer_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                amount: i.amount,
                status: i.status.clone(),
                date: i.date,
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}

/// View cache double that records every invalidation, with the same
/// generation-guarded write-back as the production cache.
#[derive(Default)]
struct CacheSlot {
    generation: u64,
    body: Option<Value>,
}

#[derive(Default)]
pub struct RecordingCache {
    slots: Mutex<HashMap<String, CacheSlot>>,
    invalidations: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.lock().unwrap().len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.slots
            .lock()
            .unwrap()
            .get(path)
            .is_some_and(|slot| slot.body.is_some())
    }
}

#[async_trait]
impl ViewCache for RecordingCache {
    async fn get(&self, path: &str) -> Option<Value> {
        self.slots
            .lock()
            .unwrap()
            .get(path)
            .and_then(|slot| slot.body.clone())
    }

    async fn generation(&self, path: &str) -> u64 {
        self.slots
            .lock()
            .unwrap()
            .get(path)
            .map(|slot| slot.generation)
            .unwrap_or(0)
    }

    async fn put(&self, path: &str, generation: u64, body: Value) {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(path.to_string()).or_default();
        if slot.generation == generation {
            slot.body = Some(body);
        }
    }

    async fn invalidate(&self, path: &str) {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(path.to_string()).or_default();
        slot.generation += 1;
        slot.body = None;
        drop(slots);
        self.invalidations.lock().unwrap().push(path.to_string());
    }
}

pub fn test_config(legacy_delete_failure: bool) -> InvoiceConfig {
    InvoiceConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "invoice-service".to_string(),
        service_version: "test".to_string(),
        log_level: "warn".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        legacy_delete_failure,
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<RecordingCache>,
}

/// Build an [`AppState`] wired to in-memory doubles, with two customers
/// ("c1", "c2") seeded.
pub fn test_state(legacy_delete_failure: bool) -> TestContext {
    let store = Arc::new(MemoryStore::default());
    store.seed_customer("c1", "Acme Corp");
    store.seed_customer("c2", "Globex");
    let cache = Arc::new(RecordingCache::default());
    let state = AppState::new(
        test_config(legacy_delete_failure),
        store.clone(),
        cache.clone(),
    );
    TestContext {
        state,
        store,
        cache,
    }
}

/// An invoice row as it would exist before a mutation under test.
pub fn existing_invoice(id: Uuid, customer_id: &str, amount: i64, status: &str) -> Invoice {
    Invoice {
        id,
        customer_id: customer_id.to_string(),
        amount,
        status: status.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    }
}
