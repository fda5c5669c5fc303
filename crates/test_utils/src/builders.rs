//! Test Data Builders
//!
//! Builders for constructing billing test data with sensible defaults, so a
//! test only spells out the fields it is about.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{ClientId, Money, TemplateId};
use domain_billing::{
    ClientSnapshot, CreateInvoice, Frequency, Invoice, InvoiceStatus, InvoiceTotals, LineItem,
    NewInvoice, NewTemplate, PaymentTerms, ShippingSelection, TaxSelection,
};

use crate::fixtures::{DateFixtures, IdFixtures, LineItemFixtures, MoneyFixtures, StringFixtures};

/// Builder for recurring templates
///
/// Defaults to a monthly USD 1500.00 retainer due today on net-30 terms.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    name: String,
    client_id: ClientId,
    frequency: Frequency,
    amount: Money,
    line_items: Vec<LineItem>,
    tax: Option<TaxSelection>,
    shipping: Option<ShippingSelection>,
    next_invoice_date: NaiveDate,
    payment_terms: PaymentTerms,
    notes: Option<String>,
}

impl TemplateBuilder {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            name: "Monthly retainer".to_string(),
            client_id,
            frequency: Frequency::Monthly,
            amount: MoneyFixtures::usd_retainer(),
            line_items: vec![LineItemFixtures::retainer()],
            tax: None,
            shipping: None,
            next_invoice_date: DateFixtures::today(),
            payment_terms: PaymentTerms::Net30,
            notes: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the subtotal and replaces the line items with a single matching line
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self.line_items = vec![LineItem::new(self.name.clone(), Decimal::ONE, amount)];
        self
    }

    pub fn with_tax(mut self, tax: TaxSelection) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_shipping(mut self, shipping: ShippingSelection) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn due_on(mut self, next_invoice_date: NaiveDate) -> Self {
        self.next_invoice_date = next_invoice_date;
        self
    }

    pub fn with_payment_terms(mut self, terms: PaymentTerms) -> Self {
        self.payment_terms = terms;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> NewTemplate {
        NewTemplate {
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
        }
    }
}

/// Builder for one-time invoice requests
#[derive(Debug, Clone)]
pub struct InvoiceRequestBuilder {
    request: CreateInvoice,
}

impl InvoiceRequestBuilder {
    /// A single consulting line with no tax or shipping
    pub fn new(client_id: ClientId) -> Self {
        Self {
            request: CreateInvoice {
                client_id,
                line_items: vec![LineItemFixtures::consulting()],
                tax: None,
                shipping: None,
                issue_date: None,
                payment_terms: None,
                notes: None,
            },
        }
    }

    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.request.line_items.push(item);
        self
    }

    pub fn with_line_items(mut self, items: Vec<LineItem>) -> Self {
        self.request.line_items = items;
        self
    }

    pub fn with_tax(mut self, tax: TaxSelection) -> Self {
        self.request.tax = Some(tax);
        self
    }

    pub fn with_shipping(mut self, shipping: ShippingSelection) -> Self {
        self.request.shipping = Some(shipping);
        self
    }

    pub fn issued_on(mut self, date: NaiveDate) -> Self {
        self.request.issue_date = Some(date);
        self
    }

    pub fn with_payment_terms(mut self, terms: PaymentTerms) -> Self {
        self.request.payment_terms = Some(terms);
        self
    }

    pub fn build(self) -> CreateInvoice {
        self.request
    }
}

/// Builder for already-stored invoices, used to seed in-memory ports
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    invoice_number: String,
    client_id: ClientId,
    amount: Money,
    status: InvoiceStatus,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    template: Option<(TemplateId, NaiveDate)>,
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceBuilder {
    pub fn new() -> Self {
        Self {
            invoice_number: StringFixtures::invoice_number().to_string(),
            client_id: IdFixtures::client_id(),
            amount: MoneyFixtures::usd_100(),
            status: InvoiceStatus::Draft,
            issue_date: DateFixtures::date(2024, 1, 1),
            due_date: DateFixtures::date(2024, 1, 31),
            template: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    /// Marks the invoice as produced by a template for the given period
    pub fn from_template(mut self, template_id: TemplateId, period: NaiveDate) -> Self {
        self.template = Some((template_id, period));
        self
    }

    pub fn build_new(self) -> NewInvoice {
        let line = LineItem::new("Services", Decimal::ONE, self.amount);
        let totals = InvoiceTotals {
            subtotal: self.amount,
            tax_amount: Money::zero(self.amount.currency()),
            shipping_amount: Money::zero(self.amount.currency()),
            amount: self.amount,
        };
        NewInvoice {
            invoice_number: self.invoice_number,
            client_id: self.client_id,
            client: ClientSnapshot {
                name: "Acme Corp".to_string(),
                email: Some("billing@acme.example".to_string()),
                address: None,
            },
            line_items: vec![line],
            totals,
            status: self.status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            notes: None,
            template_id: self.template.map(|(id, _)| id),
            template_period: self.template.map(|(_, period)| period),
        }
    }

    pub fn build(self) -> Invoice {
        self.build_new().into_invoice(Utc::now())
    }
}
