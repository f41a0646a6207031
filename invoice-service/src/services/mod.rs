//! Services module for invoice-service.

pub mod database;
pub mod metrics;
pub mod view_cache;

pub use database::{Database, InvoiceStore};
pub use metrics::{get_metrics, init_metrics};
pub use view_cache::{InMemoryViewCache, ViewCache};
