//! Payments received against invoices

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PaymentId};

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// e.g. `PAY-2024-0003`
    pub payment_number: String,
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub payment_number: String,
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            id: PaymentId::new_v7(),
            payment_number: self.payment_number,
            invoice_id: self.invoice_id,
            amount: self.amount,
            method: self.method,
            paid_on: self.paid_on,
            reference: self.reference,
            created_at: now,
        }
    }
}
