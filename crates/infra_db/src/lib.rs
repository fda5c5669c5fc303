//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the billing system using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL for
//! one table each and speak in row structs, while the adapters implement the
//! `domain_billing` ports on top of them.
//!
//! Invoice numbers are unique, and a template can produce at most one
//! invoice per scheduled period; both are enforced by unique indexes so that
//! concurrent recurring runs cannot double-bill.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresInvoiceAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/billing")).await?;
//! run_migrations(&pool).await?;
//! let invoices = PostgresInvoiceAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    PostgresClientAdapter, PostgresExpenseAdapter, PostgresInvoiceAdapter, PostgresPaymentAdapter,
    PostgresSettingsAdapter, PostgresTemplateAdapter,
};
pub use error::DatabaseError;
pub use pool::{create_pool, ping, run_migrations, DatabaseConfig, DatabasePool};
