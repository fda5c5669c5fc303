//! Recurring template repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use domain_billing::{Frequency, LineItem, PaymentTerms, ShippingSelection, TaxSelection};

use crate::error::DatabaseError;

const TEMPLATE_COLUMNS: &str = "template_id, name, client_id, frequency, amount, currency, \
     line_items, tax, shipping, next_invoice_date, payment_terms, notes, is_active, \
     last_fired_period, created_at, updated_at";

/// Database representation of the billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "billing_frequency", rename_all = "snake_case")]
pub enum DbFrequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl From<Frequency> for DbFrequency {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Weekly => DbFrequency::Weekly,
            Frequency::Monthly => DbFrequency::Monthly,
            Frequency::Quarterly => DbFrequency::Quarterly,
            Frequency::Yearly => DbFrequency::Yearly,
        }
    }
}

impl From<DbFrequency> for Frequency {
    fn from(frequency: DbFrequency) -> Self {
        match frequency {
            DbFrequency::Weekly => Frequency::Weekly,
            DbFrequency::Monthly => Frequency::Monthly,
            DbFrequency::Quarterly => Frequency::Quarterly,
            DbFrequency::Yearly => Frequency::Yearly,
        }
    }
}

/// Database representation of payment terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_terms")]
pub enum DbPaymentTerms {
    #[sqlx(rename = "due_on_receipt")]
    DueOnReceipt,
    #[sqlx(rename = "net_15")]
    Net15,
    #[sqlx(rename = "net_30")]
    Net30,
    #[sqlx(rename = "net_60")]
    Net60,
    #[sqlx(rename = "net_90")]
    Net90,
}

impl From<PaymentTerms> for DbPaymentTerms {
    fn from(terms: PaymentTerms) -> Self {
        match terms {
            PaymentTerms::DueOnReceipt => DbPaymentTerms::DueOnReceipt,
            PaymentTerms::Net15 => DbPaymentTerms::Net15,
            PaymentTerms::Net30 => DbPaymentTerms::Net30,
            PaymentTerms::Net60 => DbPaymentTerms::Net60,
            PaymentTerms::Net90 => DbPaymentTerms::Net90,
        }
    }
}

impl From<DbPaymentTerms> for PaymentTerms {
    fn from(terms: DbPaymentTerms) -> Self {
        match terms {
            DbPaymentTerms::DueOnReceipt => PaymentTerms::DueOnReceipt,
            DbPaymentTerms::Net15 => PaymentTerms::Net15,
            DbPaymentTerms::Net30 => PaymentTerms::Net30,
            DbPaymentTerms::Net60 => PaymentTerms::Net60,
            DbPaymentTerms::Net90 => PaymentTerms::Net90,
        }
    }
}

/// A row of the `recurring_templates` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TemplateRow {
    pub template_id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub frequency: DbFrequency,
    pub amount: Decimal,
    pub currency: String,
    pub line_items: Json<Vec<LineItem>>,
    pub tax: Option<Json<TaxSelection>>,
    pub shipping: Option<Json<ShippingSelection>>,
    pub next_invoice_date: NaiveDate,
    pub payment_terms: DbPaymentTerms,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_fired_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &TemplateRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO recurring_templates (
                template_id, name, client_id, frequency, amount, currency,
                line_items, tax, shipping, next_invoice_date, payment_terms,
                notes, is_active, last_fired_period, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(row.template_id)
        .bind(&row.name)
        .bind(row.client_id)
        .bind(row.frequency)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.line_items)
        .bind(&row.tax)
        .bind(&row.shipping)
        .bind(row.next_invoice_date)
        .bind(row.payment_terms)
        .bind(&row.notes)
        .bind(row.is_active)
        .bind(row.last_fired_period)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, template_id: Uuid) -> Result<TemplateRow, DatabaseError> {
        Self::fetch(&self.pool, template_id, false).await
    }

    /// Reads a template, row-locking it when `for_update` is set
    pub async fn fetch<'e>(
        executor: impl PgExecutor<'e>,
        template_id: Uuid,
        for_update: bool,
    ) -> Result<TemplateRow, DatabaseError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates WHERE template_id = $1{lock}"
        ))
        .bind(template_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("RecurringTemplate", template_id))
    }

    pub async fn list(&self) -> Result<Vec<TemplateRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates ORDER BY created_at, template_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active templates in creation order
    pub async fn list_active(&self) -> Result<Vec<TemplateRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates \
             WHERE is_active ORDER BY created_at, template_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Overwrites every mutable column of the template
    pub async fn update<'e>(executor: impl PgExecutor<'e>, row: &TemplateRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE recurring_templates
               SET name = $2, client_id = $3, frequency = $4, amount = $5, currency = $6,
                   line_items = $7, tax = $8, shipping = $9, next_invoice_date = $10,
                   payment_terms = $11, notes = $12, is_active = $13,
                   last_fired_period = $14, updated_at = $15
             WHERE template_id = $1
            "#,
        )
        .bind(row.template_id)
        .bind(&row.name)
        .bind(row.client_id)
        .bind(row.frequency)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.line_items)
        .bind(&row.tax)
        .bind(&row.shipping)
        .bind(row.next_invoice_date)
        .bind(row.payment_terms)
        .bind(&row.notes)
        .bind(row.is_active)
        .bind(row.last_fired_period)
        .bind(row.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("RecurringTemplate", row.template_id));
        }
        Ok(())
    }
}
