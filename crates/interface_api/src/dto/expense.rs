//! Expense DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClientId, Currency, Money};
use domain_billing::{CreateExpense, Expense};

use super::positive;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[validate(length(max = 200))]
    pub vendor: Option<String>,
    /// Client the expense is billable to
    pub client_id: Option<Uuid>,
    pub incurred_on: Option<NaiveDate>,
}

impl CreateExpenseRequest {
    pub fn into_command(self, currency: Currency) -> CreateExpense {
        CreateExpense {
            description: self.description,
            category: self.category,
            amount: Money::new(self.amount, currency),
            vendor: self.vendor,
            client_id: self.client_id.map(ClientId::from_uuid),
            incurred_on: self.incurred_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub expense_number: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub vendor: Option<String>,
    pub client_id: Option<Uuid>,
    pub incurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: *expense.id.as_uuid(),
            expense_number: expense.expense_number,
            description: expense.description,
            category: expense.category,
            amount: expense.amount.amount(),
            currency: expense.amount.currency(),
            vendor: expense.vendor,
            client_id: expense.client_id.map(|id| *id.as_uuid()),
            incurred_on: expense.incurred_on,
            created_at: expense.created_at,
        }
    }
}
