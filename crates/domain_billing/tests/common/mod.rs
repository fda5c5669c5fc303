//! Shared wiring for the domain_billing integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use core_kernel::{ClientId, Currency, FixedClock, Money};
use domain_billing::ports::mock::{
    MockClientPort, MockExpensePort, MockInvoicePort, MockPaymentPort, MockSettingsPort, MockTemplatePort,
};
use domain_billing::{
    BillingPorts, BillingService, CatchUpPolicy, Client, ClientPort, Frequency, NewClient, NewTemplate,
    PaymentTerms, RecurringInvoiceProcessor, RecurringTemplate, TemplatePort,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

/// Mock ports plus a service whose clock is pinned to `today`
pub struct Harness {
    pub today: NaiveDate,
    pub clients: Arc<MockClientPort>,
    pub invoices: Arc<MockInvoicePort>,
    pub templates: Arc<MockTemplatePort>,
    pub payments: Arc<MockPaymentPort>,
    pub expenses: Arc<MockExpensePort>,
    pub settings: Arc<MockSettingsPort>,
    pub service: BillingService,
}

impl Harness {
    pub fn on(today: NaiveDate) -> Self {
        let clients = Arc::new(MockClientPort::new());
        let invoices = Arc::new(MockInvoicePort::new());
        let templates = Arc::new(MockTemplatePort::new());
        let payments = Arc::new(MockPaymentPort::new());
        let expenses = Arc::new(MockExpensePort::new());
        let settings = Arc::new(MockSettingsPort::new());

        let ports = BillingPorts {
            clients: clients.clone(),
            invoices: invoices.clone(),
            templates: templates.clone(),
            payments: payments.clone(),
            expenses: expenses.clone(),
            settings: settings.clone(),
        };
        let service = BillingService::new(ports, FixedClock::shared(today));

        Self {
            today,
            clients,
            invoices,
            templates,
            payments,
            expenses,
            settings,
            service,
        }
    }

    pub fn processor(&self, policy: CatchUpPolicy) -> RecurringInvoiceProcessor {
        self.service.recurring_processor(policy)
    }

    pub async fn client(&self, name: &str) -> Client {
        self.clients
            .create(NewClient::new(name).with_email("billing@example.com"))
            .await
            .unwrap()
    }

    /// Stores a template directly, skipping service validation
    pub async fn template(
        &self,
        client_id: ClientId,
        frequency: Frequency,
        next_invoice_date: NaiveDate,
        amount: Decimal,
    ) -> RecurringTemplate {
        self.templates
            .create(NewTemplate {
                name: format!("{} retainer", frequency.as_str()),
                client_id,
                frequency,
                amount: usd(amount),
                line_items: Vec::new(),
                tax: None,
                shipping: None,
                next_invoice_date,
                payment_terms: PaymentTerms::Net30,
                notes: None,
            })
            .await
            .unwrap()
    }
}
