//! Business expenses

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, ExpenseId, Money};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// e.g. `EXP-2024-0012`
    pub expense_number: String,
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub vendor: Option<String>,
    /// Client the expense is billable to, if any
    pub client_id: Option<ClientId>,
    pub incurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub expense_number: String,
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub vendor: Option<String>,
    pub client_id: Option<ClientId>,
    pub incurred_on: NaiveDate,
}

impl NewExpense {
    pub fn into_expense(self, now: DateTime<Utc>) -> Expense {
        Expense {
            id: ExpenseId::new_v7(),
            expense_number: self.expense_number,
            description: self.description,
            category: self.category,
            amount: self.amount,
            vendor: self.vendor,
            client_id: self.client_id,
            incurred_on: self.incurred_on,
            created_at: now,
        }
    }
}
