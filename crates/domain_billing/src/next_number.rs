//! Next document number resolution
//!
//! Given the last issued number of a document type, work out the number the
//! next document gets. Sequences restart at the configured start number when
//! the year rolls over (if the type resets yearly) and when the previous
//! number cannot be read at all.

use std::sync::Arc;
use tracing::{instrument, warn};

use core_kernel::Clock;

use crate::error::BillingError;
use crate::numbering::{generate, parse, DocumentType};
use crate::ports::{ExpensePort, InvoicePort, PaymentPort};
use crate::settings::NumberingSettingsResolver;

pub struct NextNumberResolver {
    settings: Arc<NumberingSettingsResolver>,
    clock: Arc<dyn Clock>,
    invoices: Arc<dyn InvoicePort>,
    payments: Arc<dyn PaymentPort>,
    expenses: Arc<dyn ExpensePort>,
}

impl NextNumberResolver {
    pub fn new(
        settings: Arc<NumberingSettingsResolver>,
        clock: Arc<dyn Clock>,
        invoices: Arc<dyn InvoicePort>,
        payments: Arc<dyn PaymentPort>,
        expenses: Arc<dyn ExpensePort>,
    ) -> Self {
        Self {
            settings,
            clock,
            invoices,
            payments,
            expenses,
        }
    }

    /// The number following `last`, or the first number when `last` is `None`
    #[instrument(skip(self), fields(document_type = %document_type))]
    pub async fn next(&self, document_type: DocumentType, last: Option<&str>) -> String {
        let settings = self.settings.get(document_type).await;
        let year = self.clock.current_year();

        let Some(last) = last else {
            return generate(&settings, settings.start_number, Some(year));
        };

        let parsed = parse(last);
        let Some(sequence) = parsed.sequence else {
            warn!(
                document_type = %document_type,
                last_number = %last,
                start_number = settings.start_number,
                "Previous document number is unparsable, restarting sequence"
            );
            return generate(&settings, settings.start_number, Some(year));
        };

        let rolled_over = parsed.year.is_some_and(|y| y < year);
        if settings.reset_on_new_year && rolled_over {
            return generate(&settings, settings.start_number, Some(year));
        }

        generate(&settings, sequence.saturating_add(1), Some(year))
    }

    /// The next number for the type, based on the latest one in its store
    pub async fn next_for(&self, document_type: DocumentType) -> Result<String, BillingError> {
        let last = self.latest_number(document_type).await?;
        Ok(self.next(document_type, last.as_deref()).await)
    }

    async fn latest_number(&self, document_type: DocumentType) -> Result<Option<String>, BillingError> {
        let latest = match document_type {
            DocumentType::Invoice => self.invoices.latest_number().await?,
            DocumentType::Payment => self.payments.latest_number().await?,
            DocumentType::Expense => self.expenses.latest_number().await?,
        };
        Ok(latest)
    }
}

impl std::fmt::Debug for NextNumberResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextNumberResolver")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
