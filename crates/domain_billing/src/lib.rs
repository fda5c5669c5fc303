//! Billing Domain - Clients, Invoices and Recurring Billing
//!
//! This crate holds the billing rules of the workspace: clients, one-time
//! and recurring invoices, payments, expenses, document numbering and the
//! settings those depend on. Storage is reached only through the port traits
//! in [`ports`].
//!
//! # Document numbering
//!
//! Invoices, payments and expenses get numbers like `INV-2024-0007`. The
//! format per document type comes from [`NumberingSettings`], resolved by
//! [`NumberingSettingsResolver`]; [`NextNumberResolver`] computes the number
//! following the last one issued, restarting the sequence on a new year when
//! configured.
//!
//! # Recurring invoices
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, CatchUpPolicy};
//!
//! let service = BillingService::new(ports, clock);
//! let report = service
//!     .recurring_processor(CatchUpPolicy::OnePeriodPerRun)
//!     .run()
//!     .await?;
//!
//! for fired in &report.fired {
//!     println!("{} covers {}", fired.invoice_number, fired.period);
//! }
//! ```

pub mod client;
pub mod error;
pub mod expense;
pub mod invoice;
pub mod next_number;
pub mod numbering;
pub mod payment;
pub mod ports;
pub mod recurring;
pub mod services;
pub mod settings;
pub mod template;

pub use client::{Client, ClientPatch, NewClient};
pub use error::BillingError;
pub use expense::{Expense, NewExpense};
pub use invoice::{
    ClientSnapshot, Invoice, InvoiceStatus, InvoiceTotals, LineItem, NewInvoice, ShippingSelection,
    TaxSelection,
};
pub use next_number::NextNumberResolver;
pub use numbering::{generate, parse, DocumentType, NumberingSettings, NumberingSettingsPatch, ParsedNumber};
pub use payment::{NewPayment, Payment, PaymentMethod};
pub use ports::{ClientPort, ExpensePort, InvoicePort, PaymentPort, SettingsPort, TemplatePort};
pub use recurring::{CatchUpPolicy, FiredInvoice, ProcessingReport, RecurringInvoiceProcessor, TemplateFailure};
pub use services::{BillingPorts, BillingService, CreateExpense, CreateInvoice, RecordPayment};
pub use settings::{DateFormat, GeneralSettings, GeneralSettingsResolver, NumberingSettingsResolver};
pub use template::{Frequency, NewTemplate, PaymentTerms, RecurringTemplate, TemplatePatch};
