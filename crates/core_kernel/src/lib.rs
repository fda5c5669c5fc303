//! Core Kernel - Foundational types and utilities for the billing system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with precise decimal arithmetic
//! - Calendar arithmetic and an injectable clock for "today"
//! - Strongly-typed identifiers
//! - The port error taxonomy and marker traits for domain ports

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{Clock, SystemClock, FixedClock, Timezone, CalendarError, add_months};
pub use identifiers::{ClientId, InvoiceId, TemplateId, PaymentId, ExpenseId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
