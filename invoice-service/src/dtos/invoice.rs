use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw invoice form fields as submitted by the dashboard.
///
/// Every field arrives as a string and defaults to empty when absent, so
/// validation owns every failure mode; deserialization never rejects a form.
/// `id` and `date` are not accepted from input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceForm {
    #[serde(rename = "customerId", default)]
    pub customer_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub status: String,
}

/// Body re-rendered into the form when validation rejects a submission:
/// per-field messages plus an overall message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormState {
    pub errors: BTreeMap<&'static str, Vec<String>>,
    pub message: String,
}
