//! Expense handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::dto::expense::*;
use crate::{error::ApiError, AppState};

pub async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiError> {
    request.validate()?;
    let currency = state.service.general_settings().get().await.currency;
    let expense = state
        .service
        .create_expense(request.into_command(currency))
        .await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

pub async fn list_expenses(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let expenses = state.service.list_expenses().await?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}
