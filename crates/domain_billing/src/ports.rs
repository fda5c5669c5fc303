//! Billing Domain Ports
//!
//! The storage the billing domain needs, expressed as traits. The Postgres
//! adapters in `infra_db` implement them for production; the in-memory
//! adapters in [`mock`] implement them for tests and local wiring.
//!
//! ```rust,ignore
//! let processor = RecurringInvoiceProcessor::new(
//!     templates,   // Arc<dyn TemplatePort>
//!     invoices,    // Arc<dyn InvoicePort>
//!     clients,     // Arc<dyn ClientPort>
//!     numbers,     // Arc<NextNumberResolver>
//!     clock,
//! );
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{
    ClientId, DomainPort, HealthCheckable, InvoiceId, Money, PortError, TemplateId,
};

use crate::client::{Client, ClientPatch, NewClient};
use crate::expense::{Expense, NewExpense};
use crate::invoice::{Invoice, InvoiceStatus, NewInvoice};
use crate::payment::{NewPayment, Payment};
use crate::template::{NewTemplate, RecurringTemplate, TemplatePatch};

/// Key-value settings store
///
/// Values are opaque JSON documents; typed decoding happens in the
/// resolvers in [`crate::settings`].
#[async_trait]
pub trait SettingsPort: DomainPort + HealthCheckable {
    /// Returns the stored value, or `None` when the key was never set
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, PortError>;

    /// Stores a value under `key`, replacing any previous one
    async fn set(&self, key: &str, value: serde_json::Value, category: &str) -> Result<(), PortError>;
}

#[async_trait]
pub trait ClientPort: DomainPort + HealthCheckable {
    async fn create(&self, client: NewClient) -> Result<Client, PortError>;

    async fn get(&self, id: ClientId) -> Result<Client, PortError>;

    /// All clients, oldest first
    async fn list(&self) -> Result<Vec<Client>, PortError>;

    async fn update(&self, id: ClientId, patch: ClientPatch) -> Result<Client, PortError>;
}

/// Recurring template store
#[async_trait]
pub trait TemplatePort: DomainPort + HealthCheckable {
    async fn create(&self, template: NewTemplate) -> Result<RecurringTemplate, PortError>;

    async fn get(&self, id: TemplateId) -> Result<RecurringTemplate, PortError>;

    /// All templates, oldest first
    async fn list(&self) -> Result<Vec<RecurringTemplate>, PortError>;

    /// Active templates, oldest first
    async fn list_active(&self) -> Result<Vec<RecurringTemplate>, PortError>;

    /// Applies a patch and returns the updated template
    async fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<RecurringTemplate, PortError>;

    async fn set_active(&self, id: TemplateId, is_active: bool) -> Result<RecurringTemplate, PortError> {
        self.update(id, TemplatePatch::set_active(is_active)).await
    }
}

/// Invoice store
#[async_trait]
pub trait InvoicePort: DomainPort + HealthCheckable {
    /// Persists a new invoice
    ///
    /// Fails with `PortError::Conflict` when the invoice number is taken, or
    /// when another invoice already holds the same template period.
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice, PortError>;

    async fn get(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// All invoices, oldest first
    async fn list(&self) -> Result<Vec<Invoice>, PortError>;

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, PortError>;

    /// Number of the most recently created invoice
    async fn latest_number(&self) -> Result<Option<String>, PortError>;

    /// The invoice a template produced for a scheduled period, if any
    async fn find_by_template_period(
        &self,
        template_id: TemplateId,
        period: NaiveDate,
    ) -> Result<Option<Invoice>, PortError>;

    async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<Invoice, PortError>;

    /// Stores a new paid total together with the resulting status
    async fn record_payment_total(
        &self,
        id: InvoiceId,
        amount_paid: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice, PortError>;
}

#[async_trait]
pub trait PaymentPort: DomainPort + HealthCheckable {
    async fn create(&self, payment: NewPayment) -> Result<Payment, PortError>;

    async fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError>;

    /// Number of the most recently recorded payment
    async fn latest_number(&self) -> Result<Option<String>, PortError>;
}

#[async_trait]
pub trait ExpensePort: DomainPort + HealthCheckable {
    async fn create(&self, expense: NewExpense) -> Result<Expense, PortError>;

    /// All expenses, oldest first
    async fn list(&self) -> Result<Vec<Expense>, PortError>;

    /// Number of the most recently created expense
    async fn latest_number(&self) -> Result<Option<String>, PortError>;
}

/// In-memory adapters
///
/// Records are kept in insertion order so `list` and `latest_number` behave
/// like the Postgres adapters ordering by creation time. A few adapters
/// accept injected failures for exercising error paths.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory settings store
    #[derive(Debug, Default)]
    pub struct MockSettingsPort {
        values: Arc<RwLock<HashMap<String, (serde_json::Value, String)>>>,
        unavailable: AtomicBool,
        reads: AtomicUsize,
    }

    impl MockSettingsPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Stores a raw value, bypassing any typed encoding
        pub async fn insert_raw(&self, key: &str, value: serde_json::Value) {
            self.values
                .write()
                .await
                .insert(key.to_string(), (value, "test".to_string()));
        }

        /// Makes every subsequent `get` and `set` fail with a connection error
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Number of `get` calls that reached the store
        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub async fn category_of(&self, key: &str) -> Option<String> {
            self.values.read().await.get(key).map(|(_, c)| c.clone())
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("settings store unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockSettingsPort {}

    #[async_trait]
    impl HealthCheckable for MockSettingsPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-settings-port")
        }
    }

    #[async_trait]
    impl SettingsPort for MockSettingsPort {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, PortError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            Ok(self.values.read().await.get(key).map(|(v, _)| v.clone()))
        }

        async fn set(&self, key: &str, value: serde_json::Value, category: &str) -> Result<(), PortError> {
            self.check_available()?;
            self.values
                .write()
                .await
                .insert(key.to_string(), (value, category.to_string()));
            Ok(())
        }
    }

    /// In-memory client store
    #[derive(Debug, Default)]
    pub struct MockClientPort {
        clients: Arc<RwLock<Vec<Client>>>,
    }

    impl MockClientPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_clients(clients: Vec<Client>) -> Self {
            let port = Self::new();
            port.clients.write().await.extend(clients);
            port
        }
    }

    impl DomainPort for MockClientPort {}

    #[async_trait]
    impl HealthCheckable for MockClientPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-client-port")
        }
    }

    #[async_trait]
    impl ClientPort for MockClientPort {
        async fn create(&self, client: NewClient) -> Result<Client, PortError> {
            let client = client.into_client(Utc::now());
            self.clients.write().await.push(client.clone());
            Ok(client)
        }

        async fn get(&self, id: ClientId) -> Result<Client, PortError> {
            self.clients
                .read()
                .await
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Client", id))
        }

        async fn list(&self) -> Result<Vec<Client>, PortError> {
            Ok(self.clients.read().await.clone())
        }

        async fn update(&self, id: ClientId, patch: ClientPatch) -> Result<Client, PortError> {
            let mut clients = self.clients.write().await;
            let client = clients
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| PortError::not_found("Client", id))?;
            patch.apply(client, Utc::now());
            Ok(client.clone())
        }
    }

    /// In-memory template store
    #[derive(Debug, Default)]
    pub struct MockTemplatePort {
        templates: Arc<RwLock<Vec<RecurringTemplate>>>,
        failing_updates: Arc<RwLock<HashSet<TemplateId>>>,
    }

    impl MockTemplatePort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_templates(templates: Vec<RecurringTemplate>) -> Self {
            let port = Self::new();
            port.templates.write().await.extend(templates);
            port
        }

        /// Makes `update` fail for the template until [`Self::clear_failures`]
        pub async fn fail_updates_for(&self, id: TemplateId) {
            self.failing_updates.write().await.insert(id);
        }

        pub async fn clear_failures(&self) {
            self.failing_updates.write().await.clear();
        }
    }

    impl DomainPort for MockTemplatePort {}

    #[async_trait]
    impl HealthCheckable for MockTemplatePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-template-port")
        }
    }

    #[async_trait]
    impl TemplatePort for MockTemplatePort {
        async fn create(&self, template: NewTemplate) -> Result<RecurringTemplate, PortError> {
            let template = template.into_template(Utc::now());
            self.templates.write().await.push(template.clone());
            Ok(template)
        }

        async fn get(&self, id: TemplateId) -> Result<RecurringTemplate, PortError> {
            self.templates
                .read()
                .await
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("RecurringTemplate", id))
        }

        async fn list(&self) -> Result<Vec<RecurringTemplate>, PortError> {
            Ok(self.templates.read().await.clone())
        }

        async fn list_active(&self) -> Result<Vec<RecurringTemplate>, PortError> {
            Ok(self
                .templates
                .read()
                .await
                .iter()
                .filter(|t| t.is_active)
                .cloned()
                .collect())
        }

        async fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<RecurringTemplate, PortError> {
            if self.failing_updates.read().await.contains(&id) {
                return Err(PortError::connection(format!("update of template {id} failed")));
            }
            let mut templates = self.templates.write().await;
            let template = templates
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| PortError::not_found("RecurringTemplate", id))?;
            patch.apply(template, Utc::now());
            Ok(template.clone())
        }
    }

    /// In-memory invoice store enforcing unique numbers and template periods
    #[derive(Debug, Default)]
    pub struct MockInvoicePort {
        invoices: Arc<RwLock<Vec<Invoice>>>,
    }

    impl MockInvoicePort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_invoices(invoices: Vec<Invoice>) -> Self {
            let port = Self::new();
            port.invoices.write().await.extend(invoices);
            port
        }

        pub async fn count(&self) -> usize {
            self.invoices.read().await.len()
        }
    }

    impl DomainPort for MockInvoicePort {}

    #[async_trait]
    impl HealthCheckable for MockInvoicePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-invoice-port")
        }
    }

    #[async_trait]
    impl InvoicePort for MockInvoicePort {
        async fn create(&self, invoice: NewInvoice) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            if invoices.iter().any(|i| i.invoice_number == invoice.invoice_number) {
                return Err(PortError::conflict(format!(
                    "invoice number {} already exists",
                    invoice.invoice_number
                )));
            }
            if let (Some(template_id), Some(period)) = (invoice.template_id, invoice.template_period) {
                if invoices
                    .iter()
                    .any(|i| i.template_id == Some(template_id) && i.template_period == Some(period))
                {
                    return Err(PortError::conflict(format!(
                        "template {template_id} already invoiced for {period}"
                    )));
                }
            }
            let invoice = invoice.into_invoice(Utc::now());
            invoices.push(invoice.clone());
            Ok(invoice)
        }

        async fn get(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.invoices
                .read()
                .await
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn list(&self) -> Result<Vec<Invoice>, PortError> {
            Ok(self.invoices.read().await.clone())
        }

        async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, PortError> {
            Ok(self
                .invoices
                .read()
                .await
                .iter()
                .filter(|i| i.status == status)
                .cloned()
                .collect())
        }

        async fn latest_number(&self) -> Result<Option<String>, PortError> {
            Ok(self.invoices.read().await.last().map(|i| i.invoice_number.clone()))
        }

        async fn find_by_template_period(
            &self,
            template_id: TemplateId,
            period: NaiveDate,
        ) -> Result<Option<Invoice>, PortError> {
            Ok(self
                .invoices
                .read()
                .await
                .iter()
                .find(|i| i.template_id == Some(template_id) && i.template_period == Some(period))
                .cloned())
        }

        async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            let invoice = invoices
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| PortError::not_found("Invoice", id))?;
            invoice.status = status;
            invoice.updated_at = Utc::now();
            Ok(invoice.clone())
        }

        async fn record_payment_total(
            &self,
            id: InvoiceId,
            amount_paid: Money,
            status: InvoiceStatus,
        ) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            let invoice = invoices
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| PortError::not_found("Invoice", id))?;
            invoice.amount_paid = amount_paid;
            invoice.status = status;
            invoice.updated_at = Utc::now();
            Ok(invoice.clone())
        }
    }

    #[derive(Debug, Default)]
    pub struct MockPaymentPort {
        payments: Arc<RwLock<Vec<Payment>>>,
    }

    impl MockPaymentPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockPaymentPort {}

    #[async_trait]
    impl HealthCheckable for MockPaymentPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-payment-port")
        }
    }

    #[async_trait]
    impl PaymentPort for MockPaymentPort {
        async fn create(&self, payment: NewPayment) -> Result<Payment, PortError> {
            let mut payments = self.payments.write().await;
            if payments.iter().any(|p| p.payment_number == payment.payment_number) {
                return Err(PortError::conflict(format!(
                    "payment number {} already exists",
                    payment.payment_number
                )));
            }
            let payment = payment.into_payment(Utc::now());
            payments.push(payment.clone());
            Ok(payment)
        }

        async fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
            Ok(self
                .payments
                .read()
                .await
                .iter()
                .filter(|p| p.invoice_id == invoice_id)
                .cloned()
                .collect())
        }

        async fn latest_number(&self) -> Result<Option<String>, PortError> {
            Ok(self.payments.read().await.last().map(|p| p.payment_number.clone()))
        }
    }

    #[derive(Debug, Default)]
    pub struct MockExpensePort {
        expenses: Arc<RwLock<Vec<Expense>>>,
    }

    impl MockExpensePort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockExpensePort {}

    #[async_trait]
    impl HealthCheckable for MockExpensePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-expense-port")
        }
    }

    #[async_trait]
    impl ExpensePort for MockExpensePort {
        async fn create(&self, expense: NewExpense) -> Result<Expense, PortError> {
            let mut expenses = self.expenses.write().await;
            if expenses.iter().any(|e| e.expense_number == expense.expense_number) {
                return Err(PortError::conflict(format!(
                    "expense number {} already exists",
                    expense.expense_number
                )));
            }
            let expense = expense.into_expense(Utc::now());
            expenses.push(expense.clone());
            Ok(expense)
        }

        async fn list(&self) -> Result<Vec<Expense>, PortError> {
            Ok(self.expenses.read().await.clone())
        }

        async fn latest_number(&self) -> Result<Option<String>, PortError> {
            Ok(self.expenses.read().await.last().map(|e| e.expense_number.clone()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::client::NewClient;

        #[tokio::test]
        async fn test_mock_settings_round_trip() {
            let port = MockSettingsPort::new();
            port.set("numbering.invoice", serde_json::json!({"prefix": "BIL"}), "numbering")
                .await
                .unwrap();

            let value = port.get("numbering.invoice").await.unwrap().unwrap();
            assert_eq!(value["prefix"], "BIL");
            assert_eq!(port.category_of("numbering.invoice").await.as_deref(), Some("numbering"));
            assert!(port.get("numbering.expense").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_mock_settings_unavailable() {
            let port = MockSettingsPort::new();
            port.set_unavailable(true);
            assert!(port.get("numbering.invoice").await.unwrap_err().is_transient());
        }

        #[tokio::test]
        async fn test_mock_client_update_and_missing() {
            let port = MockClientPort::new();
            let client = port.create(NewClient::new("Acme Ltd")).await.unwrap();

            let updated = port.update(client.id, ClientPatch::deactivate()).await.unwrap();
            assert!(!updated.is_active);

            let missing = port.get(ClientId::new()).await.unwrap_err();
            assert!(missing.is_not_found());
        }
    }
}
