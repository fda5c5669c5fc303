//! PostgreSQL payment and expense adapters

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ClientId, DomainPort, ExpenseId, HealthCheckResult, HealthCheckable, InvoiceId, PaymentId,
    PortError,
};
use domain_billing::{Expense, ExpensePort, NewExpense, NewPayment, Payment, PaymentPort};

use super::{currency_from_db, database_health, money_from_db};
use crate::repositories::{ExpenseRepository, ExpenseRow, PaymentRepository, PaymentRow};

#[derive(Debug, Clone)]
pub struct PostgresPaymentAdapter {
    repository: PaymentRepository,
    pool: PgPool,
}

impl PostgresPaymentAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PaymentRepository::new(pool.clone()),
            pool,
        }
    }
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        payment_id: *payment.id.as_uuid(),
        payment_number: payment.payment_number.clone(),
        invoice_id: *payment.invoice_id.as_uuid(),
        amount: payment.amount.amount(),
        currency: payment.amount.currency().code().to_string(),
        method: payment.method.into(),
        paid_on: payment.paid_on,
        reference: payment.reference.clone(),
        created_at: payment.created_at,
    }
}

fn payment_from_row(row: PaymentRow) -> Result<Payment, PortError> {
    let currency = currency_from_db(&row.currency)?;
    Ok(Payment {
        id: PaymentId::from_uuid(row.payment_id),
        payment_number: row.payment_number,
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        amount: money_from_db(row.amount, currency),
        method: row.method.into(),
        paid_on: row.paid_on,
        reference: row.reference,
        created_at: row.created_at,
    })
}

impl DomainPort for PostgresPaymentAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPaymentAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-payment-adapter").await
    }
}

#[async_trait]
impl PaymentPort for PostgresPaymentAdapter {
    #[instrument(skip(self, payment), fields(invoice_id = %payment.invoice_id))]
    async fn create(&self, payment: NewPayment) -> Result<Payment, PortError> {
        let payment = payment.into_payment(Utc::now());
        self.repository.insert(&payment_to_row(&payment)).await?;
        debug!(payment_id = %payment.id, "Payment recorded");
        Ok(payment)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        self.repository
            .list_for_invoice(*invoice_id.as_uuid())
            .await?
            .into_iter()
            .map(payment_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn latest_number(&self) -> Result<Option<String>, PortError> {
        Ok(self.repository.latest_number().await?)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresExpenseAdapter {
    repository: ExpenseRepository,
    pool: PgPool,
}

impl PostgresExpenseAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ExpenseRepository::new(pool.clone()),
            pool,
        }
    }
}

fn expense_to_row(expense: &Expense) -> ExpenseRow {
    ExpenseRow {
        expense_id: *expense.id.as_uuid(),
        expense_number: expense.expense_number.clone(),
        description: expense.description.clone(),
        category: expense.category.clone(),
        amount: expense.amount.amount(),
        currency: expense.amount.currency().code().to_string(),
        vendor: expense.vendor.clone(),
        client_id: expense.client_id.map(|id| *id.as_uuid()),
        incurred_on: expense.incurred_on,
        created_at: expense.created_at,
    }
}

fn expense_from_row(row: ExpenseRow) -> Result<Expense, PortError> {
    let currency = currency_from_db(&row.currency)?;
    Ok(Expense {
        id: ExpenseId::from_uuid(row.expense_id),
        expense_number: row.expense_number,
        description: row.description,
        category: row.category,
        amount: money_from_db(row.amount, currency),
        vendor: row.vendor,
        client_id: row.client_id.map(ClientId::from_uuid),
        incurred_on: row.incurred_on,
        created_at: row.created_at,
    })
}

impl DomainPort for PostgresExpenseAdapter {}

#[async_trait]
impl HealthCheckable for PostgresExpenseAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-expense-adapter").await
    }
}

#[async_trait]
impl ExpensePort for PostgresExpenseAdapter {
    #[instrument(skip(self, expense), fields(category = %expense.category))]
    async fn create(&self, expense: NewExpense) -> Result<Expense, PortError> {
        let expense = expense.into_expense(Utc::now());
        self.repository.insert(&expense_to_row(&expense)).await?;
        debug!(expense_id = %expense.id, "Expense recorded");
        Ok(expense)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Expense>, PortError> {
        self.repository
            .list()
            .await?
            .into_iter()
            .map(expense_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn latest_number(&self) -> Result<Option<String>, PortError> {
        Ok(self.repository.latest_number().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, Money};
    use domain_billing::PaymentMethod;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_row_conversion_keeps_every_field() {
        let payment = NewPayment {
            payment_number: "PAY-2024-0001".to_string(),
            invoice_id: InvoiceId::new(),
            amount: Money::new(dec!(120.50), Currency::EUR),
            method: PaymentMethod::BankTransfer,
            paid_on: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            reference: Some("wire 8812".to_string()),
        }
        .into_payment(Utc::now());

        assert_eq!(payment_from_row(payment_to_row(&payment)).unwrap(), payment);
    }

    #[test]
    fn test_expense_row_conversion_keeps_every_field() {
        let expense = NewExpense {
            expense_number: "EXP-2024-0003".to_string(),
            description: "Domain renewal".to_string(),
            category: "software".to_string(),
            amount: Money::new(dec!(15), Currency::USD),
            vendor: None,
            client_id: Some(ClientId::new()),
            incurred_on: NaiveDate::from_ymd_opt(2024, 4, 9).unwrap(),
        }
        .into_expense(Utc::now());

        assert_eq!(expense_from_row(expense_to_row(&expense)).unwrap(), expense);
    }
}
