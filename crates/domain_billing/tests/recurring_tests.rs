//! Recurring invoice processor tests

mod common;

use chrono::Days;
use rust_decimal_macros::dec;

use core_kernel::{ClientId, Rate};
use domain_billing::{
    BillingError, CatchUpPolicy, Frequency, InvoicePort, InvoiceStatus, LineItem, PaymentTerms,
    ShippingSelection, TaxSelection, TemplatePatch, TemplatePort,
};

use common::{date, usd, Harness};

mod firing {
    use super::*;

    #[tokio::test]
    async fn test_due_template_fires_once_and_advances_from_due_date() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let due = today - Days::new(5);
        let template = h.template(client.id, Frequency::Monthly, due, dec!(500)).await;

        let report = h.processor(CatchUpPolicy::OnePeriodPerRun).run().await.unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.fired_count(), 1);
        assert!(!report.has_failures());

        let invoices = h.invoices.list().await.unwrap();
        assert_eq!(invoices.len(), 1);
        let invoice = &invoices[0];
        assert_eq!(invoice.invoice_number, "INV-2024-0001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.issue_date, today);
        assert_eq!(invoice.due_date, today + Days::new(30));
        assert_eq!(invoice.amount, usd(dec!(500)));
        assert_eq!(invoice.template_id, Some(template.id));
        assert_eq!(invoice.template_period, Some(due));
        assert_eq!(invoice.client.name, "Acme Ltd");
        assert_eq!(invoice.client.email.as_deref(), Some("billing@example.com"));

        let advanced = h.templates.get(template.id).await.unwrap();
        assert_eq!(advanced.next_invoice_date, date(2024, 4, 15));
        assert_eq!(advanced.last_fired_period, Some(due));
        assert_eq!(advanced.amount, template.amount);
        assert_eq!(advanced.name, template.name);
    }

    #[tokio::test]
    async fn test_template_due_today_fires() {
        let today = date(2024, 6, 1);
        let h = Harness::on(today);
        let client = h.client("Globex").await;
        h.template(client.id, Frequency::Weekly, today, dec!(80)).await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.fired_count(), 1);
        assert_eq!(report.fired[0].period, today);
    }

    #[tokio::test]
    async fn test_future_template_is_left_untouched() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h
            .template(client.id, Frequency::Monthly, date(2024, 3, 21), dec!(500))
            .await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.fired_count(), 0);
        assert_eq!(h.invoices.count().await, 0);
        assert_eq!(h.templates.get(template.id).await.unwrap(), template);
    }

    #[tokio::test]
    async fn test_inactive_templates_are_not_examined() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(500)).await;
        h.templates.set_active(template.id, false).await.unwrap();

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.examined, 0);
        assert_eq!(h.invoices.count().await, 0);
    }

    #[tokio::test]
    async fn test_invoice_uses_latest_template_values() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(500)).await;

        let edit = TemplatePatch {
            amount: Some(usd(dec!(200))),
            line_items: Some(vec![LineItem::new("Hosting", dec!(2), usd(dec!(100)))]),
            tax: Some(Some(TaxSelection {
                label: "VAT".to_string(),
                rate: Rate::from_percentage(dec!(20)),
            })),
            shipping: Some(Some(ShippingSelection {
                label: "Courier".to_string(),
                amount: usd(dec!(12.50)),
            })),
            payment_terms: Some(PaymentTerms::DueOnReceipt),
            notes: Some(Some("Thanks for your business".to_string())),
            ..Default::default()
        };
        h.templates.update(template.id, edit).await.unwrap();

        h.processor(CatchUpPolicy::default()).run().await.unwrap();

        let invoice = h.invoices.list().await.unwrap().remove(0);
        assert_eq!(invoice.subtotal, usd(dec!(200)));
        assert_eq!(invoice.tax_amount, usd(dec!(40)));
        assert_eq!(invoice.shipping_amount, usd(dec!(12.50)));
        assert_eq!(invoice.amount, usd(dec!(252.50)));
        assert_eq!(invoice.line_items.len(), 1);
        assert_eq!(invoice.due_date, today);
        assert_eq!(invoice.notes.as_deref(), Some("Thanks for your business"));
    }

    #[tokio::test]
    async fn test_numbers_continue_across_templates() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        h.template(client.id, Frequency::Monthly, today, dec!(100)).await;
        h.template(client.id, Frequency::Quarterly, today, dec!(300)).await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        let numbers: Vec<_> = report.fired.iter().map(|f| f.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-2024-0001", "INV-2024-0002"]);
    }

    #[tokio::test]
    async fn test_generated_invoice_is_independent_of_template() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(100)).await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();
        h.templates
            .update(
                template.id,
                TemplatePatch {
                    amount: Some(usd(dec!(999))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let invoice = h.invoices.get(report.fired[0].invoice_id).await.unwrap();
        assert_eq!(invoice.amount, usd(dec!(100)));
    }
}

mod catch_up {
    use super::*;

    #[tokio::test]
    async fn test_one_period_per_run_needs_repeated_runs() {
        let today = date(2024, 4, 5);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h
            .template(client.id, Frequency::Monthly, date(2024, 1, 10), dec!(100))
            .await;
        let processor = h.processor(CatchUpPolicy::OnePeriodPerRun);

        let first = processor.run().await.unwrap();
        assert_eq!(first.fired_count(), 1);
        let after_first = h.templates.get(template.id).await.unwrap();
        assert_eq!(after_first.next_invoice_date, date(2024, 2, 10));
        assert!(after_first.is_due(today));

        processor.run().await.unwrap();
        processor.run().await.unwrap();
        let fourth = processor.run().await.unwrap();

        assert_eq!(fourth.fired_count(), 0);
        assert_eq!(h.invoices.count().await, 3);
        assert_eq!(
            h.templates.get(template.id).await.unwrap().next_invoice_date,
            date(2024, 4, 10)
        );
    }

    #[tokio::test]
    async fn test_up_to_policy_catches_up_in_one_run() {
        let today = date(2024, 4, 5);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h
            .template(client.id, Frequency::Monthly, date(2024, 1, 10), dec!(100))
            .await;

        let report = h.processor(CatchUpPolicy::UpTo(12)).run().await.unwrap();

        let periods: Vec<_> = report.fired.iter().map(|f| f.period).collect();
        assert_eq!(periods, vec![date(2024, 1, 10), date(2024, 2, 10), date(2024, 3, 10)]);
        let template = h.templates.get(template.id).await.unwrap();
        assert!(template.next_invoice_date > today);
        assert_eq!(template.last_fired_period, Some(date(2024, 3, 10)));
    }

    #[tokio::test]
    async fn test_up_to_policy_respects_cap() {
        let today = date(2024, 4, 5);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h
            .template(client.id, Frequency::Monthly, date(2024, 1, 10), dec!(100))
            .await;

        let report = h.processor(CatchUpPolicy::UpTo(2)).run().await.unwrap();

        assert_eq!(report.fired_count(), 2);
        assert!(h.templates.get(template.id).await.unwrap().is_due(today));
    }

    #[tokio::test]
    async fn test_month_end_schedule_clamps() {
        let today = date(2024, 2, 29);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h
            .template(client.id, Frequency::Monthly, date(2024, 1, 31), dec!(100))
            .await;

        h.processor(CatchUpPolicy::UpTo(5)).run().await.unwrap();

        let template = h.templates.get(template.id).await.unwrap();
        assert_eq!(template.next_invoice_date, date(2024, 3, 29));
        assert_eq!(h.invoices.count().await, 2);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_failed_advance_does_not_duplicate_on_next_run() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(100)).await;
        let processor = h.processor(CatchUpPolicy::default());

        h.templates.fail_updates_for(template.id).await;
        let first = processor.run().await.unwrap();
        assert_eq!(first.fired_count(), 1);
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.failures[0].template_id, template.id);
        assert_eq!(h.templates.get(template.id).await.unwrap().next_invoice_date, today);

        h.templates.clear_failures().await;
        let second = processor.run().await.unwrap();

        assert_eq!(second.fired_count(), 0);
        assert_eq!(second.skipped_duplicates, 1);
        assert!(!second.has_failures());
        assert_eq!(h.invoices.count().await, 1);
        assert_eq!(
            h.templates.get(template.id).await.unwrap().next_invoice_date,
            date(2024, 4, 20)
        );
    }

    #[tokio::test]
    async fn test_failing_template_does_not_stop_later_ones() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let orphan = h.template(ClientId::new(), Frequency::Monthly, today, dec!(100)).await;
        let client = h.client("Acme Ltd").await;
        let healthy = h.template(client.id, Frequency::Monthly, today, dec!(250)).await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].template_id, orphan.id);
        assert!(report.failures[0].error.contains("Client not found"));
        assert_eq!(report.fired.len(), 1);
        assert_eq!(report.fired[0].template_id, healthy.id);

        let orphan = h.templates.get(orphan.id).await.unwrap();
        assert_eq!(orphan.next_invoice_date, today);
    }

    #[tokio::test]
    async fn test_currency_mismatch_is_reported_per_template() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(100)).await;
        h.templates
            .update(
                template.id,
                TemplatePatch {
                    shipping: Some(Some(ShippingSelection {
                        label: "Courier".to_string(),
                        amount: core_kernel::Money::new(dec!(5), core_kernel::Currency::EUR),
                    })),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.fired_count(), 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(h.invoices.count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_client_maps_to_client_not_found() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let missing = ClientId::new();
        h.template(missing, Frequency::Yearly, today, dec!(100)).await;

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        let expected = BillingError::ClientNotFound(missing.to_string()).to_string();
        assert_eq!(report.failures[0].error, expected);
    }
}

mod inactive_clients {
    use super::*;

    #[tokio::test]
    async fn test_deactivated_client_templates_are_skipped_until_reactivated() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        let template = h.template(client.id, Frequency::Monthly, today, dec!(100)).await;
        h.service.deactivate_client(client.id).await.unwrap();

        let report = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(report.fired_count(), 0);
        assert_eq!(report.skipped_inactive_clients, 1);
        assert!(!report.has_failures());
        assert_eq!(h.invoices.count().await, 0);
        assert_eq!(h.templates.get(template.id).await.unwrap().next_invoice_date, today);

        h.service
            .update_client(
                client.id,
                domain_billing::ClientPatch {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let resumed = h.processor(CatchUpPolicy::default()).run().await.unwrap();

        assert_eq!(resumed.fired_count(), 1);
        assert_eq!(resumed.skipped_inactive_clients, 0);
    }
}

mod concurrency {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    use core_kernel::{
        DomainPort, FixedClock, HealthCheckResult, HealthCheckable, InvoiceId, Money, PortError, TemplateId,
    };
    use domain_billing::ports::mock::MockInvoicePort;
    use domain_billing::{BillingPorts, BillingService, Invoice, NewInvoice};

    /// Invoice store that yields to the scheduler on every call, so
    /// concurrent runs interleave the way they would against a database
    struct YieldingInvoices(Arc<MockInvoicePort>);

    impl DomainPort for YieldingInvoices {}

    #[async_trait]
    impl HealthCheckable for YieldingInvoices {
        async fn health_check(&self) -> HealthCheckResult {
            self.0.health_check().await
        }
    }

    #[async_trait]
    impl InvoicePort for YieldingInvoices {
        async fn create(&self, invoice: NewInvoice) -> Result<Invoice, PortError> {
            tokio::task::yield_now().await;
            self.0.create(invoice).await
        }

        async fn get(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.0.get(id).await
        }

        async fn list(&self) -> Result<Vec<Invoice>, PortError> {
            self.0.list().await
        }

        async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, PortError> {
            self.0.list_by_status(status).await
        }

        async fn latest_number(&self) -> Result<Option<String>, PortError> {
            tokio::task::yield_now().await;
            self.0.latest_number().await
        }

        async fn find_by_template_period(
            &self,
            template_id: TemplateId,
            period: NaiveDate,
        ) -> Result<Option<Invoice>, PortError> {
            tokio::task::yield_now().await;
            self.0.find_by_template_period(template_id, period).await
        }

        async fn update_status(&self, id: InvoiceId, status: InvoiceStatus) -> Result<Invoice, PortError> {
            self.0.update_status(id, status).await
        }

        async fn record_payment_total(
            &self,
            id: InvoiceId,
            amount_paid: Money,
            status: InvoiceStatus,
        ) -> Result<Invoice, PortError> {
            self.0.record_payment_total(id, amount_paid, status).await
        }
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_serialised() {
        let today = date(2024, 3, 20);
        let h = Harness::on(today);
        let client = h.client("Acme Ltd").await;
        h.template(client.id, Frequency::Monthly, today, dec!(100)).await;
        h.template(client.id, Frequency::Monthly, today, dec!(200)).await;

        let store = Arc::new(MockInvoicePort::new());
        let ports = BillingPorts {
            clients: h.clients.clone(),
            invoices: Arc::new(YieldingInvoices(store.clone())),
            templates: h.templates.clone(),
            payments: h.payments.clone(),
            expenses: h.expenses.clone(),
            settings: h.settings.clone(),
        };
        let service = BillingService::new(ports, FixedClock::shared(today));
        let scheduled = service.recurring_processor(CatchUpPolicy::default());
        let manual = service.recurring_processor(CatchUpPolicy::default());

        let (a, b) = tokio::join!(scheduled.run(), manual.run());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(!a.has_failures(), "{:?}", a.failures);
        assert!(!b.has_failures(), "{:?}", b.failures);
        assert_eq!(a.fired_count() + b.fired_count(), 2);
        assert_eq!(store.count().await, 2);

        let mut numbers: Vec<_> = store.list().await.unwrap().into_iter().map(|i| i.invoice_number).collect();
        numbers.sort();
        assert_eq!(numbers, vec!["INV-2024-0001", "INV-2024-0002"]);
    }
}
