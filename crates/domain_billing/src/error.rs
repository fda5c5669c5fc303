//! Billing domain errors

use thiserror::Error;

use core_kernel::{CalendarError, ClientId, InvoiceId, MoneyError, PortError, TemplateId};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Client not found
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Recurring template not found
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Input failed a domain rule
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Operation not allowed in the record's current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Money arithmetic failed (usually a currency mismatch)
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Date arithmetic overflowed
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Storage port failure
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        BillingError::InvalidOperation(message.into())
    }

    /// Returns true when the failure means the referenced record does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            BillingError::ClientNotFound(_)
            | BillingError::InvoiceNotFound(_)
            | BillingError::TemplateNotFound(_) => true,
            BillingError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Maps a port `NotFound` for a client onto [`BillingError::ClientNotFound`]
pub(crate) fn client_lookup(id: ClientId) -> impl FnOnce(PortError) -> BillingError {
    move |e| {
        if e.is_not_found() {
            BillingError::ClientNotFound(id.to_string())
        } else {
            e.into()
        }
    }
}

pub(crate) fn invoice_lookup(id: InvoiceId) -> impl FnOnce(PortError) -> BillingError {
    move |e| {
        if e.is_not_found() {
            BillingError::InvoiceNotFound(id.to_string())
        } else {
            e.into()
        }
    }
}

pub(crate) fn template_lookup(id: TemplateId) -> impl FnOnce(PortError) -> BillingError {
    move |e| {
        if e.is_not_found() {
            BillingError::TemplateNotFound(id.to_string())
        } else {
            e.into()
        }
    }
}
