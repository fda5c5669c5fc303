//! Invoice management
//!
//! An invoice is a fully-owned record. When it was generated from a
//! recurring template it remembers the template and the scheduled period it
//! consumed, but nothing links the two afterwards: editing either side never
//! touches the other.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, Currency, InvoiceId, Money, MoneyError, Rate, TemplateId};

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Created but not yet sent to the client
    Draft,
    /// Sent and awaiting payment
    Sent,
    /// Fully paid
    Paid,
    /// Sent and past its due date
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Whether the invoice can still receive payments
    pub fn is_open(&self) -> bool {
        matches!(self, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }
}

/// One billed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    /// `unit_price × quantity`
    pub line_total: Money,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            line_total: (unit_price * quantity).round_to_currency(),
        }
    }

    /// True when the stored total matches quantity and unit price
    pub fn is_consistent(&self) -> bool {
        self.line_total == (self.unit_price * self.quantity).round_to_currency()
    }
}

/// Sum of the line totals, or zero for an empty list
pub fn line_items_subtotal(items: &[LineItem], currency: Currency) -> Result<Money, MoneyError> {
    Money::sum(items.iter().map(|item| &item.line_total), currency)
}

/// Tax chosen for an invoice or template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSelection {
    pub label: String,
    pub rate: Rate,
}

/// Shipping charge chosen for an invoice or template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingSelection {
    pub label: String,
    pub amount: Money,
}

/// Subtotal, tax, shipping and the grand total derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub shipping_amount: Money,
    pub amount: Money,
}

impl InvoiceTotals {
    pub fn compute(
        subtotal: Money,
        tax: Option<&TaxSelection>,
        shipping: Option<&ShippingSelection>,
    ) -> Result<Self, MoneyError> {
        let currency = subtotal.currency();
        let subtotal = subtotal.round_to_currency();
        let tax_amount = tax
            .map(|t| t.rate.apply(&subtotal))
            .unwrap_or_else(|| Money::zero(currency));
        let shipping_amount = shipping
            .map(|s| s.amount.round_to_currency())
            .unwrap_or_else(|| Money::zero(currency));
        let amount = subtotal.checked_add(&tax_amount)?.checked_add(&shipping_amount)?;

        Ok(Self {
            subtotal,
            tax_amount,
            shipping_amount,
            amount,
        })
    }
}

/// Client fields copied onto the invoice when it is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// An invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Unique human-readable number, e.g. `INV-2024-0007`
    pub invoice_number: String,
    pub client_id: ClientId,
    pub client: ClientSnapshot,
    pub line_items: Vec<LineItem>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub shipping_amount: Money,
    /// Grand total: subtotal + tax + shipping
    pub amount: Money,
    pub amount_paid: Money,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    /// Template this invoice was generated from, if any
    pub template_id: Option<TemplateId>,
    /// Scheduled date of the template run that produced this invoice
    pub template_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn currency(&self) -> Currency {
        self.amount.currency()
    }

    /// Remaining amount owed
    pub fn balance_due(&self) -> Money {
        self.amount - self.amount_paid
    }

    /// Sent invoices whose due date has passed
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Sent && today > self.due_date
    }
}

/// Data for creating an invoice; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client_id: ClientId,
    pub client: ClientSnapshot,
    pub line_items: Vec<LineItem>,
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub template_id: Option<TemplateId>,
    pub template_period: Option<NaiveDate>,
}

impl NewInvoice {
    pub fn into_invoice(self, now: DateTime<Utc>) -> Invoice {
        let currency = self.totals.amount.currency();
        Invoice {
            id: InvoiceId::new_v7(),
            invoice_number: self.invoice_number,
            client_id: self.client_id,
            client: self.client,
            line_items: self.line_items,
            subtotal: self.totals.subtotal,
            tax_amount: self.totals.tax_amount,
            shipping_amount: self.totals.shipping_amount,
            amount: self.totals.amount,
            amount_paid: Money::zero(currency),
            status: self.status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            notes: self.notes,
            template_id: self.template_id,
            template_period: self.template_period,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn test_line_item_total() {
        let item = LineItem::new("Consulting", dec!(2.5), usd(dec!(120)));
        assert_eq!(item.line_total, usd(dec!(300)));
        assert!(item.is_consistent());
    }

    #[test]
    fn test_totals_with_tax_and_shipping() {
        let tax = TaxSelection {
            label: "Sales tax".to_string(),
            rate: Rate::from_percentage(dec!(10)),
        };
        let shipping = ShippingSelection {
            label: "Courier".to_string(),
            amount: usd(dec!(15)),
        };
        let totals = InvoiceTotals::compute(usd(dec!(200)), Some(&tax), Some(&shipping)).unwrap();

        assert_eq!(totals.tax_amount, usd(dec!(20)));
        assert_eq!(totals.shipping_amount, usd(dec!(15)));
        assert_eq!(totals.amount, usd(dec!(235)));
    }

    #[test]
    fn test_totals_reject_foreign_shipping_currency() {
        let shipping = ShippingSelection {
            label: "Courier".to_string(),
            amount: Money::new(dec!(5), Currency::EUR),
        };
        assert!(InvoiceTotals::compute(usd(dec!(10)), None, Some(&shipping)).is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"overdue\"");
    }
}
