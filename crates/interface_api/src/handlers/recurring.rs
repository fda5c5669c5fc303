//! Recurring run handler

use axum::{extract::State, Json};
use tracing::info;

use domain_billing::ProcessingReport;

use crate::{error::ApiError, AppState};

/// Runs the recurring processor for today and returns its report
pub async fn process_recurring(
    State(state): State<AppState>,
) -> Result<Json<ProcessingReport>, ApiError> {
    let report = state
        .service
        .recurring_processor(state.config.catch_up_policy())
        .run()
        .await?;
    info!(
        fired = report.fired_count(),
        failures = report.failures.len(),
        "Recurring run triggered over HTTP"
    );
    Ok(Json(report))
}
