//! PostgreSQL recurring template adapter

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{ClientId, DomainPort, HealthCheckResult, HealthCheckable, PortError, TemplateId};
use domain_billing::{NewTemplate, RecurringTemplate, TemplatePatch, TemplatePort};

use super::{currency_from_db, database_health, money_from_db};
use crate::error::DatabaseError;
use crate::repositories::{TemplateRepository, TemplateRow};

/// PostgreSQL-backed implementation of [`TemplatePort`]
#[derive(Debug, Clone)]
pub struct PostgresTemplateAdapter {
    repository: TemplateRepository,
    pool: PgPool,
}

impl PostgresTemplateAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: TemplateRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &TemplateRepository {
        &self.repository
    }
}

fn to_row(template: &RecurringTemplate) -> TemplateRow {
    TemplateRow {
        template_id: *template.id.as_uuid(),
        name: template.name.clone(),
        client_id: *template.client_id.as_uuid(),
        frequency: template.frequency.into(),
        amount: template.amount.amount(),
        currency: template.amount.currency().code().to_string(),
        line_items: Json(template.line_items.clone()),
        tax: template.tax.clone().map(Json),
        shipping: template.shipping.clone().map(Json),
        next_invoice_date: template.next_invoice_date,
        payment_terms: template.payment_terms.into(),
        notes: template.notes.clone(),
        is_active: template.is_active,
        last_fired_period: template.last_fired_period,
        created_at: template.created_at,
        updated_at: template.updated_at,
    }
}

fn from_row(row: TemplateRow) -> Result<RecurringTemplate, PortError> {
    let currency = currency_from_db(&row.currency)?;
    Ok(RecurringTemplate {
        id: TemplateId::from_uuid(row.template_id),
        name: row.name,
        client_id: ClientId::from_uuid(row.client_id),
        frequency: row.frequency.into(),
        amount: money_from_db(row.amount, currency),
        line_items: row.line_items.0,
        tax: row.tax.map(|Json(tax)| tax),
        shipping: row.shipping.map(|Json(shipping)| shipping),
        next_invoice_date: row.next_invoice_date,
        payment_terms: row.payment_terms.into(),
        notes: row.notes,
        is_active: row.is_active,
        last_fired_period: row.last_fired_period,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl DomainPort for PostgresTemplateAdapter {}

#[async_trait]
impl HealthCheckable for PostgresTemplateAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-template-adapter").await
    }
}

#[async_trait]
impl TemplatePort for PostgresTemplateAdapter {
    #[instrument(skip(self, template), fields(name = %template.name))]
    async fn create(&self, template: NewTemplate) -> Result<RecurringTemplate, PortError> {
        let template = template.into_template(Utc::now());
        self.repository.insert(&to_row(&template)).await?;
        debug!(template_id = %template.id, "Template created");
        Ok(template)
    }

    #[instrument(skip(self), fields(template_id = %id))]
    async fn get(&self, id: TemplateId) -> Result<RecurringTemplate, PortError> {
        from_row(self.repository.get(*id.as_uuid()).await?)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<RecurringTemplate>, PortError> {
        self.repository.list().await?.into_iter().map(from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> Result<Vec<RecurringTemplate>, PortError> {
        self.repository.list_active().await?.into_iter().map(from_row).collect()
    }

    #[instrument(skip(self, patch), fields(template_id = %id))]
    async fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<RecurringTemplate, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let row = TemplateRepository::fetch(&mut *tx, *id.as_uuid(), true).await?;
        let mut template = from_row(row)?;
        patch.apply(&mut template, Utc::now());
        TemplateRepository::update(&mut *tx, &to_row(&template)).await?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, Money, Rate};
    use domain_billing::{Frequency, LineItem, PaymentTerms, TaxSelection};
    use rust_decimal_macros::dec;

    fn template() -> RecurringTemplate {
        let usd = |amount| Money::new(amount, Currency::USD);
        NewTemplate {
            name: "Hosting".to_string(),
            client_id: ClientId::new(),
            frequency: Frequency::Monthly,
            amount: usd(dec!(250)),
            line_items: vec![LineItem::new("Hosting", dec!(1), usd(dec!(250)))],
            tax: Some(TaxSelection {
                label: "VAT".to_string(),
                rate: Rate::from_percentage(dec!(20)),
            }),
            shipping: None,
            next_invoice_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            payment_terms: PaymentTerms::Net15,
            notes: None,
        }
        .into_template(Utc::now())
    }

    #[test]
    fn test_row_conversion_keeps_every_field() {
        let template = template();
        assert_eq!(from_row(to_row(&template)).unwrap(), template);
    }

    #[test]
    fn test_unknown_stored_currency_is_a_transformation_error() {
        let mut row = to_row(&template());
        row.currency = "ZZZ".to_string();
        assert!(matches!(from_row(row), Err(PortError::Transformation { .. })));
    }
}
