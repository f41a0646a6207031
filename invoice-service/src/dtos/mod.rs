//! Request/response DTOs for invoice-service.

mod invoice;

pub use invoice::{FormState, InvoiceForm};
