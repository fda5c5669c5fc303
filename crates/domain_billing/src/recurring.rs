//! Recurring invoice processing
//!
//! One pass over the active templates. Each template whose
//! `next_invoice_date` is on or before today fires: an invoice is built from
//! the template's current values and the template's schedule moves forward
//! by one period, counted from the date that was due rather than from today.
//!
//! # Duplicate protection
//!
//! Creating the invoice and advancing the template are two separate writes.
//! Every generated invoice records the period it consumed, and before
//! firing the processor looks for an invoice with the same template and
//! period. If a previous run created the invoice but failed to advance the
//! template, this run only advances it.
//!
//! # Catch-up
//!
//! With [`CatchUpPolicy::OnePeriodPerRun`] a template that is several periods
//! behind fires once per run and stays due until enough runs have passed.
//! [`CatchUpPolicy::UpTo`] keeps firing within one run until the template is
//! scheduled in the future or the cap is reached.
//!
//! # Serialised runs
//!
//! Runs numbered from the same store must not interleave: two runs reading
//! the same latest invoice number would both try to issue the next one.
//! Processors built by one [`crate::BillingService`] share a run lock, so a
//! scheduled run and a manually triggered one execute one after the other.
//!
//! Templates of a deactivated client are skipped and left due; they resume
//! once the client is reactivated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{Clock, InvoiceId, TemplateId};

use crate::client::Client;
use crate::error::{client_lookup, BillingError};
use crate::invoice::{Invoice, InvoiceStatus, NewInvoice};
use crate::next_number::NextNumberResolver;
use crate::numbering::DocumentType;
use crate::ports::{ClientPort, InvoicePort, TemplatePort};
use crate::template::{RecurringTemplate, TemplatePatch};

/// How many overdue periods a template may fire in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchUpPolicy {
    #[default]
    OnePeriodPerRun,
    UpTo(u32),
}

impl CatchUpPolicy {
    /// Policy from a configured cap, where 0 and 1 both mean one period
    pub fn from_max_periods(max: u32) -> Self {
        if max <= 1 {
            CatchUpPolicy::OnePeriodPerRun
        } else {
            CatchUpPolicy::UpTo(max)
        }
    }

    pub fn max_periods(&self) -> u32 {
        match self {
            CatchUpPolicy::OnePeriodPerRun => 1,
            CatchUpPolicy::UpTo(max) => (*max).max(1),
        }
    }
}

/// An invoice created during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredInvoice {
    pub template_id: TemplateId,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    /// Scheduled date the invoice covers
    pub period: NaiveDate,
}

/// A template that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFailure {
    pub template_id: TemplateId,
    pub template_name: String,
    pub error: String,
}

/// Outcome of one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub run_date: NaiveDate,
    /// Active templates looked at
    pub examined: usize,
    pub fired: Vec<FiredInvoice>,
    /// Periods that already had an invoice and were only advanced
    pub skipped_duplicates: usize,
    /// Due templates left untouched because their client is deactivated
    pub skipped_inactive_clients: usize,
    pub failures: Vec<TemplateFailure>,
}

impl ProcessingReport {
    fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            examined: 0,
            fired: Vec::new(),
            skipped_duplicates: 0,
            skipped_inactive_clients: 0,
            failures: Vec::new(),
        }
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Turns due recurring templates into draft invoices
pub struct RecurringInvoiceProcessor {
    templates: Arc<dyn TemplatePort>,
    invoices: Arc<dyn InvoicePort>,
    clients: Arc<dyn ClientPort>,
    numbers: Arc<NextNumberResolver>,
    clock: Arc<dyn Clock>,
    policy: CatchUpPolicy,
    run_lock: Arc<Mutex<()>>,
}

impl RecurringInvoiceProcessor {
    pub fn new(
        templates: Arc<dyn TemplatePort>,
        invoices: Arc<dyn InvoicePort>,
        clients: Arc<dyn ClientPort>,
        numbers: Arc<NextNumberResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            invoices,
            clients,
            numbers,
            clock,
            policy: CatchUpPolicy::default(),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Shares a lock with other processors so their runs never overlap
    pub fn with_run_lock(mut self, run_lock: Arc<Mutex<()>>) -> Self {
        self.run_lock = run_lock;
        self
    }

    pub fn with_policy(mut self, policy: CatchUpPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CatchUpPolicy {
        self.policy
    }

    /// Processes templates as of the clock's today
    pub async fn run(&self) -> Result<ProcessingReport, BillingError> {
        self.run_on(self.clock.today()).await
    }

    /// Processes templates as of `today`
    ///
    /// Only a failure to list the templates aborts the run. Anything that goes
    /// wrong with a single template is logged, recorded in the report, and
    /// the run moves on to the next template.
    #[instrument(skip(self), fields(today = %today, policy = ?self.policy))]
    pub async fn run_on(&self, today: NaiveDate) -> Result<ProcessingReport, BillingError> {
        let _run = self.run_lock.lock().await;
        let templates = self.templates.list_active().await?;
        let mut report = ProcessingReport::new(today);

        for template in templates {
            report.examined += 1;
            if !template.is_due(today) {
                continue;
            }

            let template_id = template.id;
            let template_name = template.name.clone();
            if let Err(e) = self.process_template(template, today, &mut report).await {
                error!(
                    template_id = %template_id,
                    template_name = %template_name,
                    error = %e,
                    "Recurring template failed"
                );
                report.failures.push(TemplateFailure {
                    template_id,
                    template_name,
                    error: e.to_string(),
                });
            }
        }

        info!(
            examined = report.examined,
            fired = report.fired.len(),
            skipped_duplicates = report.skipped_duplicates,
            skipped_inactive_clients = report.skipped_inactive_clients,
            failures = report.failures.len(),
            "Recurring invoice run complete"
        );
        Ok(report)
    }

    async fn process_template(
        &self,
        mut template: RecurringTemplate,
        today: NaiveDate,
        report: &mut ProcessingReport,
    ) -> Result<(), BillingError> {
        let client = self
            .clients
            .get(template.client_id)
            .await
            .map_err(client_lookup(template.client_id))?;
        if !client.is_active {
            warn!(
                template_id = %template.id,
                client_id = %client.id,
                "Client is deactivated, template skipped"
            );
            report.skipped_inactive_clients += 1;
            return Ok(());
        }

        let mut periods = 0;
        while periods < self.policy.max_periods() && template.is_due(today) {
            let period = template.next_invoice_date;

            match self.invoices.find_by_template_period(template.id, period).await? {
                Some(existing) => {
                    warn!(
                        template_id = %template.id,
                        period = %period,
                        invoice_number = %existing.invoice_number,
                        "Period already invoiced, advancing schedule only"
                    );
                    report.skipped_duplicates += 1;
                }
                None => {
                    let invoice = self.fire(&template, &client, today).await?;
                    debug!(
                        template_id = %template.id,
                        invoice_number = %invoice.invoice_number,
                        period = %period,
                        "Invoice generated"
                    );
                    report.fired.push(FiredInvoice {
                        template_id: template.id,
                        invoice_id: invoice.id,
                        invoice_number: invoice.invoice_number,
                        period,
                    });
                }
            }

            let next = template.frequency.advance(period)?;
            template = self
                .templates
                .update(template.id, TemplatePatch::advance_schedule(next, period))
                .await?;
            periods += 1;
        }

        Ok(())
    }

    async fn fire(
        &self,
        template: &RecurringTemplate,
        client: &Client,
        today: NaiveDate,
    ) -> Result<Invoice, BillingError> {
        let totals = template.totals()?;
        let invoice_number = self.numbers.next_for(DocumentType::Invoice).await?;

        let invoice = NewInvoice {
            invoice_number,
            client_id: template.client_id,
            client: client.snapshot(),
            line_items: template.line_items.clone(),
            totals,
            status: InvoiceStatus::Draft,
            issue_date: today,
            due_date: template.payment_terms.due_date(today)?,
            notes: template.notes.clone(),
            template_id: Some(template.id),
            template_period: Some(template.next_invoice_date),
        };

        Ok(self.invoices.create(invoice).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_max_periods() {
        assert_eq!(CatchUpPolicy::from_max_periods(0), CatchUpPolicy::OnePeriodPerRun);
        assert_eq!(CatchUpPolicy::from_max_periods(1), CatchUpPolicy::OnePeriodPerRun);
        assert_eq!(CatchUpPolicy::from_max_periods(12), CatchUpPolicy::UpTo(12));
        assert_eq!(CatchUpPolicy::UpTo(0).max_periods(), 1);
    }
}
