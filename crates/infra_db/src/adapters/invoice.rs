//! PostgreSQL invoice adapter

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ClientId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, Money, PortError,
    TemplateId,
};
use domain_billing::{ClientSnapshot, Invoice, InvoicePort, InvoiceStatus, NewInvoice};

use super::{currency_from_db, database_health, money_from_db};
use crate::repositories::{InvoiceRepository, InvoiceRow};

/// PostgreSQL-backed implementation of [`InvoicePort`]
///
/// A second invoice for the same template period is rejected by the
/// `invoices_template_period_key` index and surfaces as `PortError::Conflict`.
#[derive(Debug, Clone)]
pub struct PostgresInvoiceAdapter {
    repository: InvoiceRepository,
    pool: PgPool,
}

impl PostgresInvoiceAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &InvoiceRepository {
        &self.repository
    }
}

fn to_row(invoice: &Invoice) -> InvoiceRow {
    InvoiceRow {
        invoice_id: *invoice.id.as_uuid(),
        invoice_number: invoice.invoice_number.clone(),
        client_id: *invoice.client_id.as_uuid(),
        client_name: invoice.client.name.clone(),
        client_email: invoice.client.email.clone(),
        client_address: invoice.client.address.clone(),
        line_items: Json(invoice.line_items.clone()),
        currency: invoice.currency().code().to_string(),
        subtotal: invoice.subtotal.amount(),
        tax_amount: invoice.tax_amount.amount(),
        shipping_amount: invoice.shipping_amount.amount(),
        amount: invoice.amount.amount(),
        amount_paid: invoice.amount_paid.amount(),
        status: invoice.status.into(),
        issue_date: invoice.issue_date,
        due_date: invoice.due_date,
        notes: invoice.notes.clone(),
        template_id: invoice.template_id.map(|id| *id.as_uuid()),
        template_period: invoice.template_period,
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    }
}

fn from_row(row: InvoiceRow) -> Result<Invoice, PortError> {
    let currency = currency_from_db(&row.currency)?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(row.invoice_id),
        invoice_number: row.invoice_number,
        client_id: ClientId::from_uuid(row.client_id),
        client: ClientSnapshot {
            name: row.client_name,
            email: row.client_email,
            address: row.client_address,
        },
        line_items: row.line_items.0,
        subtotal: money_from_db(row.subtotal, currency),
        tax_amount: money_from_db(row.tax_amount, currency),
        shipping_amount: money_from_db(row.shipping_amount, currency),
        amount: money_from_db(row.amount, currency),
        amount_paid: money_from_db(row.amount_paid, currency),
        status: row.status.into(),
        issue_date: row.issue_date,
        due_date: row.due_date,
        notes: row.notes,
        template_id: row.template_id.map(TemplateId::from_uuid),
        template_period: row.template_period,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn from_rows(rows: Vec<InvoiceRow>) -> Result<Vec<Invoice>, PortError> {
    rows.into_iter().map(from_row).collect()
}

impl DomainPort for PostgresInvoiceAdapter {}

#[async_trait]
impl HealthCheckable for PostgresInvoiceAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-invoice-adapter").await
    }
}

#[async_trait]
impl InvoicePort for PostgresInvoiceAdapter {
    #[instrument(skip(self, invoice), fields(invoice_number = %invoice.invoice_number))]
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice, PortError> {
        let invoice = invoice.into_invoice(Utc::now());
        self.repository.insert(&to_row(&invoice)).await?;
        debug!(invoice_id = %invoice.id, "Invoice created");
        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        from_row(self.repository.get(*id.as_uuid()).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Invoice>, PortError> {
        from_rows(self.repository.list().await?)
    }

    #[instrument(skip(self))]
    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, PortError> {
        from_rows(self.repository.list_by_status(status.into()).await?)
    }

    #[instrument(skip(self))]
    async fn latest_number(&self) -> Result<Option<String>, PortError> {
        Ok(self.repository.latest_number().await?)
    }

    #[instrument(skip(self), fields(template_id = %template_id))]
    async fn find_by_template_period(
        &self,
        template_id: TemplateId,
        period: NaiveDate,
    ) -> Result<Option<Invoice>, PortError> {
        self.repository
            .find_by_template_period(*template_id.as_uuid(), period)
            .await?
            .map(from_row)
            .transpose()
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<Invoice, PortError> {
        let row = self
            .repository
            .update_status(*id.as_uuid(), status.into(), Utc::now())
            .await?;
        from_row(row)
    }

    #[instrument(skip(self), fields(invoice_id = %id, amount_paid = %amount_paid))]
    async fn record_payment_total(
        &self,
        id: InvoiceId,
        amount_paid: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice, PortError> {
        let row = self
            .repository
            .update_payment_total(*id.as_uuid(), amount_paid.amount(), status.into(), Utc::now())
            .await?;
        from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use domain_billing::{InvoiceTotals, LineItem};
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_conversion_keeps_every_field() {
        let usd = |amount| Money::new(amount, Currency::USD);
        let lines = vec![LineItem::new("Retainer", dec!(2), usd(dec!(500)))];
        let totals = InvoiceTotals::compute(usd(dec!(1000)), None, None).unwrap();
        let issue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let invoice = NewInvoice {
            invoice_number: "INV-2024-0001".to_string(),
            client_id: ClientId::new(),
            client: ClientSnapshot {
                name: "Acme".to_string(),
                email: None,
                address: Some("1 Main St".to_string()),
            },
            line_items: lines,
            totals,
            status: InvoiceStatus::Draft,
            issue_date: issue,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            notes: None,
            template_id: Some(TemplateId::new()),
            template_period: Some(issue),
        }
        .into_invoice(Utc::now());

        assert_eq!(from_row(to_row(&invoice)).unwrap(), invoice);
    }
}
