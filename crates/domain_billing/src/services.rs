//! Billing application service
//!
//! Orchestrates the ports for everything a user does directly: managing
//! clients and templates, issuing one-time invoices, recording payments and
//! expenses. Numbering and settings resolvers are built here once and shared
//! with the recurring processor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use core_kernel::{Clock, ClientId, InvoiceId, Money, TemplateId};

use crate::client::{Client, ClientPatch, NewClient};
use crate::error::{client_lookup, invoice_lookup, template_lookup, BillingError};
use crate::expense::{Expense, NewExpense};
use crate::invoice::{
    line_items_subtotal, Invoice, InvoiceStatus, InvoiceTotals, LineItem, NewInvoice,
    ShippingSelection, TaxSelection,
};
use crate::next_number::NextNumberResolver;
use crate::numbering::DocumentType;
use crate::payment::{NewPayment, Payment, PaymentMethod};
use crate::ports::{ClientPort, ExpensePort, InvoicePort, PaymentPort, SettingsPort, TemplatePort};
use crate::recurring::{CatchUpPolicy, RecurringInvoiceProcessor};
use crate::settings::{GeneralSettingsResolver, NumberingSettingsResolver};
use crate::template::{NewTemplate, PaymentTerms, RecurringTemplate, TemplatePatch};

/// Every storage port the billing domain uses
#[derive(Clone)]
pub struct BillingPorts {
    pub clients: Arc<dyn ClientPort>,
    pub invoices: Arc<dyn InvoicePort>,
    pub templates: Arc<dyn TemplatePort>,
    pub payments: Arc<dyn PaymentPort>,
    pub expenses: Arc<dyn ExpensePort>,
    pub settings: Arc<dyn SettingsPort>,
}

/// Request for a one-time invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub client_id: ClientId,
    pub line_items: Vec<LineItem>,
    pub tax: Option<TaxSelection>,
    pub shipping: Option<ShippingSelection>,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    /// Defaults to the general settings' payment terms
    pub payment_terms: Option<PaymentTerms>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Defaults to today
    pub paid_on: Option<NaiveDate>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpense {
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub vendor: Option<String>,
    pub client_id: Option<ClientId>,
    /// Defaults to today
    pub incurred_on: Option<NaiveDate>,
}

/// Billing service
pub struct BillingService {
    ports: BillingPorts,
    numbering: Arc<NumberingSettingsResolver>,
    general: Arc<GeneralSettingsResolver>,
    numbers: Arc<NextNumberResolver>,
    clock: Arc<dyn Clock>,
    recurring_lock: Arc<Mutex<()>>,
}

impl BillingService {
    pub fn new(ports: BillingPorts, clock: Arc<dyn Clock>) -> Self {
        let numbering = Arc::new(NumberingSettingsResolver::new(ports.settings.clone()));
        let general = Arc::new(GeneralSettingsResolver::new(ports.settings.clone()));
        let numbers = Arc::new(NextNumberResolver::new(
            numbering.clone(),
            clock.clone(),
            ports.invoices.clone(),
            ports.payments.clone(),
            ports.expenses.clone(),
        ));

        Self {
            ports,
            numbering,
            general,
            numbers,
            clock,
            recurring_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn numbering(&self) -> &Arc<NumberingSettingsResolver> {
        &self.numbering
    }

    pub fn general_settings(&self) -> &Arc<GeneralSettingsResolver> {
        &self.general
    }

    pub fn numbers(&self) -> &Arc<NextNumberResolver> {
        &self.numbers
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// A recurring processor sharing this service's ports, resolvers and run lock
    pub fn recurring_processor(&self, policy: CatchUpPolicy) -> RecurringInvoiceProcessor {
        RecurringInvoiceProcessor::new(
            self.ports.templates.clone(),
            self.ports.invoices.clone(),
            self.ports.clients.clone(),
            self.numbers.clone(),
            self.clock.clone(),
        )
        .with_policy(policy)
        .with_run_lock(self.recurring_lock.clone())
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    #[instrument(skip(self, client), fields(name = %client.name))]
    pub async fn create_client(&self, client: NewClient) -> Result<Client, BillingError> {
        if client.name.trim().is_empty() {
            return Err(BillingError::validation("client name is required"));
        }
        let client = self.ports.clients.create(client).await?;
        info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Client, BillingError> {
        self.ports.clients.get(id).await.map_err(client_lookup(id))
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, BillingError> {
        Ok(self.ports.clients.list().await?)
    }

    #[instrument(skip(self, patch), fields(client_id = %id))]
    pub async fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client, BillingError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BillingError::validation("client name is required"));
        }
        self.ports.clients.update(id, patch).await.map_err(client_lookup(id))
    }

    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn deactivate_client(&self, id: ClientId) -> Result<Client, BillingError> {
        let client = self
            .ports
            .clients
            .update(id, ClientPatch::deactivate())
            .await
            .map_err(client_lookup(id))?;
        info!("Client deactivated");
        Ok(client)
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    /// Issues a one-time draft invoice
    #[instrument(skip(self, request), fields(client_id = %request.client_id))]
    pub async fn create_invoice(&self, request: CreateInvoice) -> Result<Invoice, BillingError> {
        if request.line_items.is_empty() {
            return Err(BillingError::validation("an invoice needs at least one line item"));
        }
        if let Some(item) = request.line_items.iter().find(|i| !i.is_consistent()) {
            return Err(BillingError::validation(format!(
                "line total of '{}' does not match quantity and unit price",
                item.description
            )));
        }

        let client = self.active_client(request.client_id).await?;
        let general = self.general.get().await;

        let subtotal = line_items_subtotal(&request.line_items, general.currency)?;
        let totals = InvoiceTotals::compute(subtotal, request.tax.as_ref(), request.shipping.as_ref())?;
        let issue_date = request.issue_date.unwrap_or_else(|| self.clock.today());
        let terms = request.payment_terms.unwrap_or(general.default_payment_terms);

        let invoice = NewInvoice {
            invoice_number: self.numbers.next_for(DocumentType::Invoice).await?,
            client_id: client.id,
            client: client.snapshot(),
            line_items: request.line_items,
            totals,
            status: InvoiceStatus::Draft,
            issue_date,
            due_date: terms.due_date(issue_date)?,
            notes: request.notes,
            template_id: None,
            template_period: None,
        };

        let invoice = self.ports.invoices.create(invoice).await?;
        info!(invoice_number = %invoice.invoice_number, amount = %invoice.amount, "Invoice created");
        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.ports.invoices.get(id).await.map_err(invoice_lookup(id))
    }

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.ports.invoices.list().await?)
    }

    pub async fn list_invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.ports.invoices.list_by_status(status).await?)
    }

    /// Moves a draft invoice to sent
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn mark_sent(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        let invoice = self.get_invoice(id).await?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(BillingError::invalid_operation(format!(
                "invoice {} is {} and cannot be sent",
                invoice.invoice_number,
                invoice.status.as_str()
            )));
        }
        let invoice = self
            .ports
            .invoices
            .update_status(id, InvoiceStatus::Sent)
            .await
            .map_err(invoice_lookup(id))?;
        info!(invoice_number = %invoice.invoice_number, "Invoice sent");
        Ok(invoice)
    }

    /// Marks sent invoices past their due date as overdue
    pub async fn refresh_overdue(&self) -> Result<usize, BillingError> {
        self.refresh_overdue_on(self.clock.today()).await
    }

    #[instrument(skip(self))]
    pub async fn refresh_overdue_on(&self, today: NaiveDate) -> Result<usize, BillingError> {
        let sent = self.ports.invoices.list_by_status(InvoiceStatus::Sent).await?;
        let mut updated = 0;
        for invoice in sent.into_iter().filter(|i| i.is_past_due(today)) {
            self.ports
                .invoices
                .update_status(invoice.id, InvoiceStatus::Overdue)
                .await?;
            updated += 1;
        }
        if updated > 0 {
            info!(count = updated, "Invoices marked overdue");
        }
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Records a payment and marks the invoice paid once the balance is settled
    #[instrument(skip(self, request), fields(invoice_id = %request.invoice_id, amount = %request.amount))]
    pub async fn record_payment(&self, request: RecordPayment) -> Result<Payment, BillingError> {
        let invoice = self.get_invoice(request.invoice_id).await?;

        if !invoice.status.is_open() {
            return Err(BillingError::invalid_operation(format!(
                "invoice {} is {} and cannot take payments",
                invoice.invoice_number,
                invoice.status.as_str()
            )));
        }
        if !request.amount.is_positive() {
            return Err(BillingError::validation("payment amount must be positive"));
        }

        let amount_paid = invoice.amount_paid.checked_add(&request.amount)?;
        if amount_paid > invoice.amount {
            return Err(BillingError::validation(format!(
                "payment of {} exceeds the balance of {}",
                request.amount,
                invoice.balance_due()
            )));
        }
        let status = if amount_paid == invoice.amount {
            InvoiceStatus::Paid
        } else {
            invoice.status
        };

        let payment = self
            .ports
            .payments
            .create(NewPayment {
                payment_number: self.numbers.next_for(DocumentType::Payment).await?,
                invoice_id: invoice.id,
                amount: request.amount,
                method: request.method,
                paid_on: request.paid_on.unwrap_or_else(|| self.clock.today()),
                reference: request.reference,
            })
            .await?;

        self.ports
            .invoices
            .record_payment_total(invoice.id, amount_paid, status)
            .await?;

        info!(
            payment_number = %payment.payment_number,
            invoice_status = status.as_str(),
            "Payment recorded"
        );
        Ok(payment)
    }

    pub async fn list_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, BillingError> {
        self.get_invoice(invoice_id).await?;
        Ok(self.ports.payments.list_for_invoice(invoice_id).await?)
    }

    // ------------------------------------------------------------------
    // Expenses
    // ------------------------------------------------------------------

    #[instrument(skip(self, request), fields(category = %request.category))]
    pub async fn create_expense(&self, request: CreateExpense) -> Result<Expense, BillingError> {
        if request.description.trim().is_empty() {
            return Err(BillingError::validation("expense description is required"));
        }
        if !request.amount.is_positive() {
            return Err(BillingError::validation("expense amount must be positive"));
        }
        if let Some(client_id) = request.client_id {
            self.get_client(client_id).await?;
        }

        let expense = self
            .ports
            .expenses
            .create(NewExpense {
                expense_number: self.numbers.next_for(DocumentType::Expense).await?,
                description: request.description,
                category: request.category,
                amount: request.amount.round_to_currency(),
                vendor: request.vendor,
                client_id: request.client_id,
                incurred_on: request.incurred_on.unwrap_or_else(|| self.clock.today()),
            })
            .await?;
        info!(expense_number = %expense.expense_number, "Expense recorded");
        Ok(expense)
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, BillingError> {
        Ok(self.ports.expenses.list().await?)
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    #[instrument(skip(self, template), fields(name = %template.name, client_id = %template.client_id))]
    pub async fn create_template(&self, template: NewTemplate) -> Result<RecurringTemplate, BillingError> {
        if template.name.trim().is_empty() {
            return Err(BillingError::validation("template name is required"));
        }
        validate_template_amount(&template.amount)?;
        InvoiceTotals::compute(template.amount, template.tax.as_ref(), template.shipping.as_ref())?;
        self.active_client(template.client_id).await?;

        let template = self.ports.templates.create(template).await?;
        info!(
            template_id = %template.id,
            next_invoice_date = %template.next_invoice_date,
            "Recurring template created"
        );
        Ok(template)
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<RecurringTemplate, BillingError> {
        self.ports.templates.get(id).await.map_err(template_lookup(id))
    }

    pub async fn list_templates(&self) -> Result<Vec<RecurringTemplate>, BillingError> {
        Ok(self.ports.templates.list().await?)
    }

    /// Applies a user edit; the firing history is not editable
    #[instrument(skip(self, patch), fields(template_id = %id))]
    pub async fn update_template(
        &self,
        id: TemplateId,
        mut patch: TemplatePatch,
    ) -> Result<RecurringTemplate, BillingError> {
        patch.last_fired_period = None;
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BillingError::validation("template name is required"));
        }
        if let Some(amount) = &patch.amount {
            validate_template_amount(amount)?;
        }
        if let Some(client_id) = patch.client_id {
            self.active_client(client_id).await?;
        }

        let current = self.get_template(id).await?;
        let amount = patch.amount.unwrap_or(current.amount);
        let tax = patch.tax.clone().unwrap_or(current.tax);
        let shipping = patch.shipping.clone().unwrap_or(current.shipping);
        InvoiceTotals::compute(amount, tax.as_ref(), shipping.as_ref())?;

        self.ports.templates.update(id, patch).await.map_err(template_lookup(id))
    }

    #[instrument(skip(self), fields(template_id = %id))]
    pub async fn set_template_active(&self, id: TemplateId, is_active: bool) -> Result<RecurringTemplate, BillingError> {
        let template = self
            .ports
            .templates
            .set_active(id, is_active)
            .await
            .map_err(template_lookup(id))?;
        info!(is_active, "Template activation changed");
        Ok(template)
    }

    async fn active_client(&self, id: ClientId) -> Result<Client, BillingError> {
        let client = self.get_client(id).await?;
        if !client.is_active {
            return Err(BillingError::invalid_operation(format!(
                "client {} is deactivated",
                client.name
            )));
        }
        Ok(client)
    }
}

fn validate_template_amount(amount: &Money) -> Result<(), BillingError> {
    if !amount.is_positive() {
        return Err(BillingError::validation("template amount must be positive"));
    }
    Ok(())
}
