//! Payment and expense repositories

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use domain_billing::PaymentMethod;

use crate::error::DatabaseError;

const PAYMENT_COLUMNS: &str =
    "payment_id, payment_number, invoice_id, amount, currency, method, paid_on, reference, created_at";

const EXPENSE_COLUMNS: &str = "expense_id, expense_number, description, category, amount, \
     currency, vendor, client_id, incurred_on, created_at";

/// Database representation of the payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum DbPaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Check,
    Other,
}

impl From<PaymentMethod> for DbPaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => DbPaymentMethod::Cash,
            PaymentMethod::BankTransfer => DbPaymentMethod::BankTransfer,
            PaymentMethod::Card => DbPaymentMethod::Card,
            PaymentMethod::Check => DbPaymentMethod::Check,
            PaymentMethod::Other => DbPaymentMethod::Other,
        }
    }
}

impl From<DbPaymentMethod> for PaymentMethod {
    fn from(method: DbPaymentMethod) -> Self {
        match method {
            DbPaymentMethod::Cash => PaymentMethod::Cash,
            DbPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
            DbPaymentMethod::Card => PaymentMethod::Card,
            DbPaymentMethod::Check => PaymentMethod::Check,
            DbPaymentMethod::Other => PaymentMethod::Other,
        }
    }
}

/// A row of the `payments` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub payment_number: String,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: DbPaymentMethod,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row of the `expenses` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExpenseRow {
    pub expense_id: Uuid,
    pub expense_number: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub vendor: Option<String>,
    pub client_id: Option<Uuid>,
    pub incurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &PaymentRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, payment_number, invoice_id, amount, currency,
                method, paid_on, reference, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.payment_id)
        .bind(&row.payment_number)
        .bind(row.invoice_id)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(row.method)
        .bind(row.paid_on)
        .bind(&row.reference)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 \
             ORDER BY created_at, payment_id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn latest_number(&self) -> Result<Option<String>, DatabaseError> {
        let number = sqlx::query_scalar::<_, String>(
            "SELECT payment_number FROM payments ORDER BY created_at DESC, payment_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &ExpenseRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO expenses (
                expense_id, expense_number, description, category, amount,
                currency, vendor, client_id, incurred_on, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(row.expense_id)
        .bind(&row.expense_number)
        .bind(&row.description)
        .bind(&row.category)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.vendor)
        .bind(row.client_id)
        .bind(row.incurred_on)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<ExpenseRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY created_at, expense_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn latest_number(&self) -> Result<Option<String>, DatabaseError> {
        let number = sqlx::query_scalar::<_, String>(
            "SELECT expense_number FROM expenses ORDER BY created_at DESC, expense_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }
}
