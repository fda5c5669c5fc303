//! Recurring template DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClientId, Currency, Money};
use domain_billing::{Frequency, NewTemplate, PaymentTerms, RecurringTemplate, TemplatePatch};

use super::{
    double_option, into_line_items, positive, LineItemRequest, LineItemResponse, ShippingRequest,
    ShippingResponse, TaxRequest, TaxResponse,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub client_id: Uuid,
    pub frequency: Frequency,
    /// Pre-tax amount billed each period
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[serde(default)]
    #[validate(nested)]
    pub line_items: Vec<LineItemRequest>,
    #[validate(nested)]
    pub tax: Option<TaxRequest>,
    #[validate(nested)]
    pub shipping: Option<ShippingRequest>,
    /// First date the template fires
    pub next_invoice_date: NaiveDate,
    pub payment_terms: Option<PaymentTerms>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateTemplateRequest {
    pub fn into_new_template(self, currency: Currency, default_terms: PaymentTerms) -> NewTemplate {
        NewTemplate {
            name: self.name,
            client_id: ClientId::from_uuid(self.client_id),
            frequency: self.frequency,
            amount: Money::new(self.amount, currency),
            line_items: into_line_items(self.line_items, currency),
            tax: self.tax.map(Into::into),
            shipping: self.shipping.map(|s| s.into_selection(currency)),
            next_invoice_date: self.next_invoice_date,
            payment_terms: self.payment_terms.unwrap_or(default_terms),
            notes: self.notes,
        }
    }
}

/// Partial template edit
///
/// `tax`, `shipping` and `notes` accept `null` to clear the current value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub client_id: Option<Uuid>,
    pub frequency: Option<Frequency>,
    #[validate(custom(function = "positive"))]
    pub amount: Option<Decimal>,
    #[validate(nested)]
    pub line_items: Option<Vec<LineItemRequest>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tax: Option<Option<TaxRequest>>,
    #[serde(default, deserialize_with = "double_option")]
    pub shipping: Option<Option<ShippingRequest>>,
    pub next_invoice_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateTemplateRequest {
    /// Validates the nested selections that the derive cannot reach
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        if let Some(Some(tax)) = &self.tax {
            tax.validate()?;
        }
        if let Some(Some(shipping)) = &self.shipping {
            shipping.validate()?;
        }
        Ok(())
    }

    /// Converts to a domain patch; money uses the template's own currency
    pub fn into_patch(self, currency: Currency) -> TemplatePatch {
        TemplatePatch {
            name: self.name,
            client_id: self.client_id.map(ClientId::from_uuid),
            frequency: self.frequency,
            amount: self.amount.map(|a| Money::new(a, currency)),
            line_items: self.line_items.map(|items| into_line_items(items, currency)),
            tax: self.tax.map(|tax| tax.map(Into::into)),
            shipping: self
                .shipping
                .map(|shipping| shipping.map(|s| s.into_selection(currency))),
            next_invoice_date: self.next_invoice_date,
            payment_terms: self.payment_terms,
            notes: self.notes,
            is_active: self.is_active,
            last_fired_period: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub frequency: Frequency,
    pub amount: Decimal,
    pub currency: Currency,
    pub line_items: Vec<LineItemResponse>,
    pub tax: Option<TaxResponse>,
    pub shipping: Option<ShippingResponse>,
    pub next_invoice_date: NaiveDate,
    pub payment_terms: PaymentTerms,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_fired_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RecurringTemplate> for TemplateResponse {
    fn from(template: RecurringTemplate) -> Self {
        Self {
            id: *template.id.as_uuid(),
            name: template.name,
            client_id: *template.client_id.as_uuid(),
            frequency: template.frequency,
            amount: template.amount.amount(),
            currency: template.amount.currency(),
            line_items: template.line_items.into_iter().map(Into::into).collect(),
            tax: template.tax.map(Into::into),
            shipping: template.shipping.map(Into::into),
            next_invoice_date: template.next_invoice_date,
            payment_terms: template.payment_terms,
            notes: template.notes,
            is_active: template.is_active,
            last_fired_period: template.last_fired_period,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}
