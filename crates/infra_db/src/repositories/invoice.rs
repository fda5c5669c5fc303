//! Invoice repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use domain_billing::{InvoiceStatus, LineItem};

use crate::error::DatabaseError;

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, client_id, client_name, client_email, \
     client_address, line_items, currency, subtotal, tax_amount, shipping_amount, amount, \
     amount_paid, status, issue_date, due_date, notes, template_id, template_period, \
     created_at, updated_at";

/// Database representation of invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
pub enum DbInvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl From<InvoiceStatus> for DbInvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Draft => DbInvoiceStatus::Draft,
            InvoiceStatus::Sent => DbInvoiceStatus::Sent,
            InvoiceStatus::Paid => DbInvoiceStatus::Paid,
            InvoiceStatus::Overdue => DbInvoiceStatus::Overdue,
        }
    }
}

impl From<DbInvoiceStatus> for InvoiceStatus {
    fn from(status: DbInvoiceStatus) -> Self {
        match status {
            DbInvoiceStatus::Draft => InvoiceStatus::Draft,
            DbInvoiceStatus::Sent => InvoiceStatus::Sent,
            DbInvoiceStatus::Paid => InvoiceStatus::Paid,
            DbInvoiceStatus::Overdue => InvoiceStatus::Overdue,
        }
    }
}

/// A row of the `invoices` table
///
/// Every money column shares the row's single `currency`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub line_items: Json<Vec<LineItem>>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub status: DbInvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub template_id: Option<Uuid>,
    pub template_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts an invoice
    ///
    /// Fails with `DuplicateEntry` when the number is taken or the template
    /// already produced an invoice for the same period.
    pub async fn insert(&self, row: &InvoiceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, client_id, client_name, client_email,
                client_address, line_items, currency, subtotal, tax_amount,
                shipping_amount, amount, amount_paid, status, issue_date, due_date,
                notes, template_id, template_period, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(row.invoice_id)
        .bind(&row.invoice_number)
        .bind(row.client_id)
        .bind(&row.client_name)
        .bind(&row.client_email)
        .bind(&row.client_address)
        .bind(&row.line_items)
        .bind(&row.currency)
        .bind(row.subtotal)
        .bind(row.tax_amount)
        .bind(row.shipping_amount)
        .bind(row.amount)
        .bind(row.amount_paid)
        .bind(row.status)
        .bind(row.issue_date)
        .bind(row.due_date)
        .bind(&row.notes)
        .bind(row.template_id)
        .bind(row.template_period)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, invoice_id: Uuid) -> Result<InvoiceRow, DatabaseError> {
        sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    pub async fn list(&self) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at, invoice_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_by_status(&self, status: DbInvoiceStatus) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = $1 \
             ORDER BY created_at, invoice_id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn latest_number(&self) -> Result<Option<String>, DatabaseError> {
        let number = sqlx::query_scalar::<_, String>(
            "SELECT invoice_number FROM invoices ORDER BY created_at DESC, invoice_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    pub async fn find_by_template_period(
        &self,
        template_id: Uuid,
        period: NaiveDate,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE template_id = $1 AND template_period = $2"
        ))
        .bind(template_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Sets the status and returns the updated row
    pub async fn update_status(
        &self,
        invoice_id: Uuid,
        status: DbInvoiceStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<InvoiceRow, DatabaseError> {
        sqlx::query_as::<_, InvoiceRow>(&format!(
            "UPDATE invoices SET status = $2, updated_at = $3 \
             WHERE invoice_id = $1 RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(invoice_id)
        .bind(status)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    /// Sets the paid total and status together and returns the updated row
    pub async fn update_payment_total(
        &self,
        invoice_id: Uuid,
        amount_paid: Decimal,
        status: DbInvoiceStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<InvoiceRow, DatabaseError> {
        sqlx::query_as::<_, InvoiceRow>(&format!(
            "UPDATE invoices SET amount_paid = $2, status = $3, updated_at = $4 \
             WHERE invoice_id = $1 RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(invoice_id)
        .bind(amount_paid)
        .bind(status)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }
}
