//! Invoice model for invoice-service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Strict parse: anything other than the two known values is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

/// Invoice row. `amount` is an integer number of cents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: String,
    pub amount: i64,
    pub status: String,
    pub date: NaiveDate,
}

/// Invoice row joined with its customer, as rendered on the list view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceListRow {
    pub id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub amount: i64,
    pub status: String,
    pub date: NaiveDate,
}

/// Input for inserting an invoice. `id` and `date` are assigned server-side.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// Fields the update operation may change. `id` and `date` are immutable.
#[derive(Debug, Clone)]
pub struct InvoiceChanges {
    pub customer_id: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}
