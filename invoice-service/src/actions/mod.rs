//! Invoice mutation actions: validate submitted form data, coerce types,
//! mutate the invoices table, and invalidate the cached list view.
//!
//! Validation failures are values ([`ActionOutcome::Rejected`]), never
//! errors; `Err` is reserved for persistence and other unexpected failures.
//! The caller invalidates/redirects only on a successful outcome.

use crate::dtos::{FormState, InvoiceForm};
use crate::models::{InvoiceChanges, InvoiceStatus, NewInvoice};
use crate::services::metrics::{ERRORS_TOTAL, INVOICES_TOTAL};
use crate::services::{InvoiceStore, ViewCache};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Path of the cached invoice-list view, and the redirect target after a
/// successful mutation.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

pub const MSG_SELECT_CUSTOMER: &str = "Please select a customer.";
pub const MSG_AMOUNT_GT_ZERO: &str = "Please enter an amount greater than $0.";
pub const MSG_SELECT_STATUS: &str = "Please select an invoice status.";

/// Outcome of a mutation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Mutation applied; the client should navigate to `location`.
    Redirect { location: &'static str },
    /// Mutation applied in place (delete); the list view was refreshed but
    /// no navigation is requested.
    Refreshed,
    /// Validation rejected the input; no database access happened.
    Rejected(FormState),
}

/// Typed, coerced bundle produced by a successful validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidFields {
    customer_id: String,
    amount_cents: i64,
    status: InvoiceStatus,
}

/// Convert a decimal dollar amount to whole cents. Midpoints round away
/// from zero, so $10.005 becomes 1001 cents. Returns `None` when the result
/// is not a positive representable cent amount, including amounts too large
/// for the multiplication itself.
fn dollars_to_cents(dollars: Decimal) -> Option<i64> {
    dollars
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|cents| *cents > 0)
}

/// Validate the raw form fields against the invoice field contract and
/// return either the coerced bundle or per-field messages.
fn validate_invoice_form(
    form: &InvoiceForm,
) -> Result<ValidFields, BTreeMap<&'static str, Vec<String>>> {
    let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

    let customer_id = form.customer_id.trim();
    if customer_id.is_empty() {
        errors
            .entry("customerId")
            .or_default()
            .push(MSG_SELECT_CUSTOMER.to_string());
    }

    let amount_cents = match Decimal::from_str(form.amount.trim()) {
        Ok(dollars) if dollars > Decimal::ZERO => dollars_to_cents(dollars),
        _ => None,
    };
    if amount_cents.is_none() {
        errors
            .entry("amount")
            .or_default()
            .push(MSG_AMOUNT_GT_ZERO.to_string());
    }

    let status = InvoiceStatus::parse(&form.status);
    if status.is_none() {
        errors
            .entry("status")
            .or_default()
            .push(MSG_SELECT_STATUS.to_string());
    }

    match (amount_cents, status) {
        (Some(amount_cents), Some(status)) if errors.is_empty() => Ok(ValidFields {
            customer_id: customer_id.to_string(),
            amount_cents,
            status,
        }),
        _ => Err(errors),
    }
}

/// The invoice mutation service. The store and view cache are injected so
/// the actions stay framework-independent and take test doubles.
#[derive(Clone)]
pub struct InvoiceActions {
    store: Arc<dyn InvoiceStore>,
    cache: Arc<dyn ViewCache>,
    legacy_delete_failure: bool,
}

impl InvoiceActions {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        cache: Arc<dyn ViewCache>,
        legacy_delete_failure: bool,
    ) -> Self {
        Self {
            store,
            cache,
            legacy_delete_failure,
        }
    }

    /// Create an invoice from submitted form data. `id` and `date` are
    /// assigned server-side; `date` is the current UTC date.
    #[instrument(skip(self, form))]
    pub async fn create_invoice(&self, form: &InvoiceForm) -> Result<ActionOutcome, AppError> {
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => {
                ERRORS_TOTAL.with_label_values(&["validation"]).inc();
                return Ok(ActionOutcome::Rejected(FormState {
                    errors,
                    message: "Failed to create invoice. Missing fields.".to_string(),
                }));
            }
        };

        let input = NewInvoice {
            customer_id: fields.customer_id,
            amount_cents: fields.amount_cents,
            status: fields.status,
            date: chrono::Utc::now().date_naive(),
        };
        let invoice = self.store.insert_invoice(&input).await?;

        INVOICES_TOTAL
            .with_label_values(&[fields.status.as_str()])
            .inc();
        info!(invoice_id = %invoice.id, customer_id = %invoice.customer_id, "Invoice created");

        self.cache.invalidate(INVOICES_PATH).await;
        Ok(ActionOutcome::Redirect {
            location: INVOICES_PATH,
        })
    }

    /// Update the customer, amount, and status of an existing invoice.
    /// `date` is never touched.
    #[instrument(skip(self, form), fields(invoice_id = %id))]
    pub async fn update_invoice(
        &self,
        id: Uuid,
        form: &InvoiceForm,
    ) -> Result<ActionOutcome, AppError> {
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => {
                ERRORS_TOTAL.with_label_values(&["validation"]).inc();
                return Ok(ActionOutcome::Rejected(FormState {
                    errors,
                    message: "Failed to update invoice. Missing fields.".to_string(),
                }));
            }
        };

        let changes = InvoiceChanges {
            customer_id: fields.customer_id,
            amount_cents: fields.amount_cents,
            status: fields.status,
        };
        let Some(invoice) = self.store.update_invoice(id, &changes).await? else {
            warn!(invoice_id = %id, "Update targeted a missing invoice");
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Invoice {} not found",
                id
            )));
        };

        info!(invoice_id = %invoice.id, "Invoice updated");

        self.cache.invalidate(INVOICES_PATH).await;
        Ok(ActionOutcome::Redirect {
            location: INVOICES_PATH,
        })
    }

    /// Delete an invoice by id, then refresh the cached list view.
    ///
    /// With `legacy_delete_failure` set the action reproduces the historical
    /// behavior: it fails unconditionally before any database interaction.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn delete_invoice(&self, id: Uuid) -> Result<ActionOutcome, AppError> {
        if self.legacy_delete_failure {
            ERRORS_TOTAL.with_label_values(&["legacy_delete"]).inc();
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Error deleting invoice."
            )));
        }

        let deleted = self.store.delete_invoice(id).await?;
        if !deleted {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Invoice {} not found",
                id
            )));
        }

        info!(invoice_id = %id, "Invoice deleted");

        self.cache.invalidate(INVOICES_PATH).await;
        Ok(ActionOutcome::Refreshed)
    }
}
