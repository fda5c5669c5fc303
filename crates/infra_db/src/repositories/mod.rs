//! Repository implementations for database operations
//!
//! Each repository owns the SQL for one table and speaks in row structs;
//! translation to domain types happens in the adapters.

mod client;
mod invoice;
mod payment;
mod settings;
mod template;

pub use client::{ClientRepository, ClientRow};
pub use invoice::{DbInvoiceStatus, InvoiceRepository, InvoiceRow};
pub use payment::{DbPaymentMethod, ExpenseRepository, ExpenseRow, PaymentRepository, PaymentRow};
pub use settings::SettingsRepository;
pub use template::{DbFrequency, DbPaymentTerms, TemplateRepository, TemplateRow};
