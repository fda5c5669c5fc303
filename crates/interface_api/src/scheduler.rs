//! Background recurring invoice scheduler
//!
//! Runs the recurring processor once at start-up and then on a fixed
//! interval. Runs never overlap: the next tick waits for the current run,
//! and ticks missed while a run was in progress are skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use domain_billing::{BillingService, CatchUpPolicy, ProcessingReport};

/// Runs the processor once and logs the outcome
pub async fn run_once(service: &BillingService, policy: CatchUpPolicy) -> Option<ProcessingReport> {
    match service.recurring_processor(policy).run().await {
        Ok(report) => {
            if report.has_failures() {
                warn!(
                    run_date = %report.run_date,
                    fired = report.fired_count(),
                    failures = report.failures.len(),
                    "Recurring run finished with failures"
                );
            } else {
                info!(
                    run_date = %report.run_date,
                    examined = report.examined,
                    fired = report.fired_count(),
                    skipped_duplicates = report.skipped_duplicates,
                    skipped_inactive_clients = report.skipped_inactive_clients,
                    "Recurring run finished"
                );
            }
            Some(report)
        }
        Err(e) => {
            error!(error = %e, "Recurring run aborted");
            None
        }
    }
}

/// Spawns the scheduler task; the first tick fires immediately
pub fn spawn(service: Arc<BillingService>, policy: CatchUpPolicy, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), ?policy, "Starting recurring scheduler");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            run_once(&service, policy).await;
        }
    })
}
