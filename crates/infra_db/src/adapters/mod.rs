//! Domain adapters
//!
//! PostgreSQL implementations of the billing ports. Each adapter:
//! - Implements one port trait from `domain_billing`
//! - Translates between domain models and repository row types
//! - Converts `DatabaseError` into `PortError` at the boundary
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresInvoiceAdapter;
//! use domain_billing::InvoicePort;
//!
//! let adapter = PostgresInvoiceAdapter::new(pool);
//! let invoice = adapter.get(invoice_id).await?;
//! ```

mod client;
mod invoice;
mod payment;
mod settings;
mod template;

pub use client::PostgresClientAdapter;
pub use invoice::PostgresInvoiceAdapter;
pub use payment::{PostgresExpenseAdapter, PostgresPaymentAdapter};
pub use settings::PostgresSettingsAdapter;
pub use template::PostgresTemplateAdapter;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, Currency, HealthCheckResult, Money, PortError};

/// Probes the pool with `SELECT 1`
pub(crate) async fn database_health(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}

/// Parses a stored currency code
pub(crate) fn currency_from_db(code: &str) -> Result<Currency, PortError> {
    code.parse::<Currency>()
        .map_err(|e| PortError::transformation(format!("stored currency: {e}")))
}

pub(crate) fn money_from_db(amount: Decimal, currency: Currency) -> Money {
    Money::new(amount, currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_db_accepts_known_codes() {
        assert_eq!(currency_from_db("EUR").unwrap(), Currency::EUR);
    }

    #[test]
    fn test_currency_from_db_rejects_unknown_codes() {
        let error = currency_from_db("XYZ").unwrap_err();
        assert!(matches!(error, PortError::Transformation { .. }));
    }
}
