//! Recurring invoice templates
//!
//! A template is the blueprint a recurring run turns into invoices. It owns
//! its scheduling state (`next_invoice_date`, `last_fired_period`), which
//! only the recurring processor advances.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{add_months, CalendarError, ClientId, Money, MoneyError, TemplateId};

use crate::invoice::{InvoiceTotals, LineItem, ShippingSelection, TaxSelection};

/// How often a template fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The date one period after `date`
    ///
    /// Month-based frequencies clamp to the last day of the target month.
    pub fn advance(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        match self {
            Frequency::Weekly => date
                .checked_add_days(Days::new(7))
                .ok_or(CalendarError::OutOfRange { date, months: 0 }),
            Frequency::Monthly => add_months(date, 1),
            Frequency::Quarterly => add_months(date, 3),
            Frequency::Yearly => add_months(date, 12),
        }
    }
}

/// Named offset from issue date to due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentTerms {
    #[serde(rename = "due_on_receipt")]
    DueOnReceipt,
    #[serde(rename = "net_15")]
    Net15,
    #[default]
    #[serde(rename = "net_30")]
    Net30,
    #[serde(rename = "net_60")]
    Net60,
    #[serde(rename = "net_90")]
    Net90,
}

impl PaymentTerms {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTerms::DueOnReceipt => "due_on_receipt",
            PaymentTerms::Net15 => "net_15",
            PaymentTerms::Net30 => "net_30",
            PaymentTerms::Net60 => "net_60",
            PaymentTerms::Net90 => "net_90",
        }
    }

    pub fn days(&self) -> u64 {
        match self {
            PaymentTerms::DueOnReceipt => 0,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net60 => 60,
            PaymentTerms::Net90 => 90,
        }
    }

    pub fn due_date(&self, issued_on: NaiveDate) -> Result<NaiveDate, CalendarError> {
        issued_on
            .checked_add_days(Days::new(self.days()))
            .ok_or(CalendarError::OutOfRange {
                date: issued_on,
                months: 0,
            })
    }
}

/// A recurring invoice template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: TemplateId,
    pub name: String,
    pub client_id: ClientId,
    pub frequency: Frequency,
    /// Pre-tax subtotal billed each period
    pub amount: Money,
    pub line_items: Vec<LineItem>,
    pub tax: Option<TaxSelection>,
    pub shipping: Option<ShippingSelection>,
    pub next_invoice_date: NaiveDate,
    pub payment_terms: PaymentTerms,
    pub notes: Option<String>,
    pub is_active: bool,
    /// Scheduled date consumed by the most recent firing
    pub last_fired_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTemplate {
    /// Whether the template should fire on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_active && self.next_invoice_date <= today
    }

    /// Totals of an invoice generated from the template's current values
    pub fn totals(&self) -> Result<InvoiceTotals, MoneyError> {
        InvoiceTotals::compute(self.amount, self.tax.as_ref(), self.shipping.as_ref())
    }
}

/// Data for creating a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub client_id: ClientId,
    pub frequency: Frequency,
    pub amount: Money,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub tax: Option<TaxSelection>,
    pub shipping: Option<ShippingSelection>,
    pub next_invoice_date: NaiveDate,
    #[serde(default)]
    pub payment_terms: PaymentTerms,
    pub notes: Option<String>,
}

impl NewTemplate {
    pub fn into_template(self, now: DateTime<Utc>) -> RecurringTemplate {
        RecurringTemplate {
            id: TemplateId::new_v7(),
            name: self.name,
            client_id: self.client_id,
            frequency: self.frequency,
            amount: self.amount,
            line_items: self.line_items,
            tax: self.tax,
            shipping: self.shipping,
            next_invoice_date: self.next_invoice_date,
            payment_terms: self.payment_terms,
            notes: self.notes,
            is_active: true,
            last_fired_period: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a template; `None` leaves a field unchanged
///
/// Nullable attributes use a nested option so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub client_id: Option<ClientId>,
    pub frequency: Option<Frequency>,
    pub amount: Option<Money>,
    pub line_items: Option<Vec<LineItem>>,
    pub tax: Option<Option<TaxSelection>>,
    pub shipping: Option<Option<ShippingSelection>>,
    pub next_invoice_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub last_fired_period: Option<NaiveDate>,
}

impl TemplatePatch {
    /// The patch a firing writes: the advanced schedule and nothing else
    pub fn advance_schedule(next_invoice_date: NaiveDate, fired_period: NaiveDate) -> Self {
        Self {
            next_invoice_date: Some(next_invoice_date),
            last_fired_period: Some(fired_period),
            ..Default::default()
        }
    }

    pub fn set_active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, template: &mut RecurringTemplate, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(client_id) = self.client_id {
            template.client_id = client_id;
        }
        if let Some(frequency) = self.frequency {
            template.frequency = frequency;
        }
        if let Some(amount) = self.amount {
            template.amount = amount;
        }
        if let Some(line_items) = self.line_items {
            template.line_items = line_items;
        }
        if let Some(tax) = self.tax {
            template.tax = tax;
        }
        if let Some(shipping) = self.shipping {
            template.shipping = shipping;
        }
        if let Some(date) = self.next_invoice_date {
            template.next_invoice_date = date;
        }
        if let Some(terms) = self.payment_terms {
            template.payment_terms = terms;
        }
        if let Some(notes) = self.notes {
            template.notes = notes;
        }
        if let Some(active) = self.is_active {
            template.is_active = active;
        }
        if let Some(period) = self.last_fired_period {
            template.last_fired_period = Some(period);
        }
        template.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_frequency_advance() {
        let start = date(2024, 1, 15);
        assert_eq!(Frequency::Weekly.advance(start).unwrap(), date(2024, 1, 22));
        assert_eq!(Frequency::Monthly.advance(start).unwrap(), date(2024, 2, 15));
        assert_eq!(Frequency::Quarterly.advance(start).unwrap(), date(2024, 4, 15));
        assert_eq!(Frequency::Yearly.advance(start).unwrap(), date(2025, 1, 15));
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        assert_eq!(Frequency::Monthly.advance(date(2024, 1, 31)).unwrap(), date(2024, 2, 29));
        assert_eq!(Frequency::Monthly.advance(date(2023, 1, 31)).unwrap(), date(2023, 2, 28));
        assert_eq!(Frequency::Yearly.advance(date(2024, 2, 29)).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_payment_terms_offsets() {
        let issued = date(2024, 3, 1);
        assert_eq!(PaymentTerms::DueOnReceipt.due_date(issued).unwrap(), issued);
        assert_eq!(PaymentTerms::Net15.due_date(issued).unwrap(), date(2024, 3, 16));
        assert_eq!(PaymentTerms::Net30.due_date(issued).unwrap(), date(2024, 3, 31));
        assert_eq!(PaymentTerms::Net60.due_date(issued).unwrap(), date(2024, 4, 30));
        assert_eq!(PaymentTerms::Net90.due_date(issued).unwrap(), date(2024, 5, 30));
    }

    #[test]
    fn test_payment_terms_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentTerms::Net30).unwrap(), "\"net_30\"");
        let terms: PaymentTerms = serde_json::from_str("\"due_on_receipt\"").unwrap();
        assert_eq!(terms, PaymentTerms::DueOnReceipt);
    }

    #[test]
    fn test_schedule_patch_touches_only_schedule() {
        let patch = TemplatePatch::advance_schedule(date(2024, 2, 1), date(2024, 1, 1));
        assert_eq!(patch.next_invoice_date, Some(date(2024, 2, 1)));
        assert_eq!(patch.last_fired_period, Some(date(2024, 1, 1)));
        assert!(patch.name.is_none() && patch.amount.is_none() && patch.is_active.is_none());
    }
}
