//! Invoice and payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClientId, Currency, InvoiceId, Money};
use domain_billing::{
    CreateInvoice, Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentTerms, RecordPayment,
};

use super::{into_line_items, positive, LineItemRequest, LineItemResponse, ShippingRequest, TaxRequest};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1), nested)]
    pub line_items: Vec<LineItemRequest>,
    #[validate(nested)]
    pub tax: Option<TaxRequest>,
    #[validate(nested)]
    pub shipping: Option<ShippingRequest>,
    pub issue_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateInvoiceRequest {
    pub fn into_command(self, currency: Currency) -> CreateInvoice {
        CreateInvoice {
            client_id: ClientId::from_uuid(self.client_id),
            line_items: into_line_items(self.line_items, currency),
            tax: self.tax.map(Into::into),
            shipping: self.shipping.map(|s| s.into_selection(currency)),
            issue_date: self.issue_date,
            payment_terms: self.payment_terms,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub currency: Currency,
    pub line_items: Vec<LineItemResponse>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub template_id: Option<Uuid>,
    pub template_period: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: *invoice.id.as_uuid(),
            currency: invoice.currency(),
            balance_due: invoice.balance_due().amount(),
            invoice_number: invoice.invoice_number,
            client_id: *invoice.client_id.as_uuid(),
            client_name: invoice.client.name,
            client_email: invoice.client.email,
            client_address: invoice.client.address,
            line_items: invoice.line_items.into_iter().map(Into::into).collect(),
            subtotal: invoice.subtotal.amount(),
            tax_amount: invoice.tax_amount.amount(),
            shipping_amount: invoice.shipping_amount.amount(),
            amount: invoice.amount.amount(),
            amount_paid: invoice.amount_paid.amount(),
            status: invoice.status,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            notes: invoice.notes,
            template_id: invoice.template_id.map(|id| *id.as_uuid()),
            template_period: invoice.template_period,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub paid_on: Option<NaiveDate>,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

impl RecordPaymentRequest {
    /// Payments are taken in the invoice's own currency
    pub fn into_command(self, invoice_id: InvoiceId, currency: Currency) -> RecordPayment {
        RecordPayment {
            invoice_id,
            amount: Money::new(self.amount, currency),
            method: self.method,
            paid_on: self.paid_on,
            reference: self.reference,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_number: String,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            payment_number: payment.payment_number,
            invoice_id: *payment.invoice_id.as_uuid(),
            amount: payment.amount.amount(),
            currency: payment.amount.currency(),
            method: payment.method,
            paid_on: payment.paid_on,
            reference: payment.reference,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OverdueRefreshResponse {
    pub updated: usize,
}
