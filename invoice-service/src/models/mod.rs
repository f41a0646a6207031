//! Domain models for invoice-service.

mod invoice;

pub use invoice::{Invoice, InvoiceChanges, InvoiceListRow, InvoiceStatus, NewInvoice};
