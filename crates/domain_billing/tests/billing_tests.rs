//! Billing service tests

mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{ClientId, Currency, InvoiceId, Money, Rate, TemplateId};
use domain_billing::{
    BillingError, ClientPatch, CreateExpense, CreateInvoice, Frequency, InvoiceStatus, LineItem,
    NewClient, NewTemplate, PaymentMethod, PaymentTerms, RecordPayment, TaxSelection, TemplatePatch,
};

use common::{date, usd, Harness};

fn one_time(client_id: ClientId, items: Vec<LineItem>) -> CreateInvoice {
    CreateInvoice {
        client_id,
        line_items: items,
        tax: None,
        shipping: None,
        issue_date: None,
        payment_terms: None,
        notes: None,
    }
}

fn payment(invoice_id: InvoiceId, amount: Money) -> RecordPayment {
    RecordPayment {
        invoice_id,
        amount,
        method: PaymentMethod::BankTransfer,
        paid_on: None,
        reference: Some("TRX-881".to_string()),
    }
}

fn retainer(client_id: ClientId, amount: Money) -> NewTemplate {
    NewTemplate {
        name: "Monthly retainer".to_string(),
        client_id,
        frequency: Frequency::Monthly,
        amount,
        line_items: Vec::new(),
        tax: None,
        shipping: None,
        next_invoice_date: date(2024, 4, 1),
        payment_terms: PaymentTerms::Net15,
        notes: None,
    }
}

mod clients {
    use super::*;

    #[tokio::test]
    async fn test_create_requires_name() {
        let h = Harness::on(date(2024, 3, 1));
        let err = h.service.create_client(NewClient::new("  ")).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.service.create_client(NewClient::new("Initech")).await.unwrap();

        let patch = ClientPatch {
            address: Some("4120 Freidrich Lane".to_string()),
            ..Default::default()
        };
        let updated = h.service.update_client(client.id, patch).await.unwrap();
        assert_eq!(updated.address.as_deref(), Some("4120 Freidrich Lane"));
        assert!(updated.is_active);

        let deactivated = h.service.deactivate_client(client.id).await.unwrap();
        assert!(!deactivated.is_active);
        assert_eq!(h.service.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let h = Harness::on(date(2024, 3, 1));
        let err = h.service.get_client(ClientId::new()).await.unwrap_err();
        assert!(matches!(err, BillingError::ClientNotFound(_)));
        assert!(err.is_not_found());
    }
}

mod invoices {
    use super::*;

    #[tokio::test]
    async fn test_one_time_invoice_totals_and_terms() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let mut request = one_time(
            client.id,
            vec![
                LineItem::new("Design", dec!(10), usd(dec!(95))),
                LineItem::new("Review", dec!(1.5), usd(dec!(120))),
            ],
        );
        request.tax = Some(TaxSelection {
            label: "Sales tax".to_string(),
            rate: Rate::from_percentage(dec!(8.25)),
        });

        let invoice = h.service.create_invoice(request).await.unwrap();

        assert_eq!(invoice.invoice_number, "INV-2024-0001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal, usd(dec!(1130)));
        assert_eq!(invoice.tax_amount, usd(dec!(93.23)));
        assert_eq!(invoice.amount, usd(dec!(1223.23)));
        assert_eq!(invoice.issue_date, date(2024, 3, 1));
        assert_eq!(invoice.due_date, date(2024, 3, 31));
        assert!(invoice.template_id.is_none());
    }

    #[tokio::test]
    async fn test_explicit_terms_and_issue_date() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let mut request = one_time(client.id, vec![LineItem::new("Audit", dec!(1), usd(dec!(400)))]);
        request.issue_date = Some(date(2024, 2, 20));
        request.payment_terms = Some(PaymentTerms::Net60);

        let invoice = h.service.create_invoice(request).await.unwrap();
        assert_eq!(invoice.due_date, date(2024, 4, 20));
    }

    #[tokio::test]
    async fn test_rejects_empty_and_inconsistent_lines() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;

        let empty = h.service.create_invoice(one_time(client.id, vec![])).await;
        assert!(matches!(empty, Err(BillingError::Validation(_))));

        let mut item = LineItem::new("Design", dec!(2), usd(dec!(50)));
        item.line_total = usd(dec!(75));
        let inconsistent = h.service.create_invoice(one_time(client.id, vec![item])).await;
        assert!(matches!(inconsistent, Err(BillingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_general_settings_currency_applies() {
        let h = Harness::on(date(2024, 3, 1));
        h.settings.insert_raw("settings.general", json!({"currency": "EUR"})).await;
        let client = h.client("Initech").await;

        let usd_lines = one_time(client.id, vec![LineItem::new("Design", dec!(1), usd(dec!(50)))]);
        let err = h.service.create_invoice(usd_lines).await.unwrap_err();
        assert!(matches!(err, BillingError::Money(_)));

        let eur = Money::new(dec!(50), Currency::EUR);
        let invoice = h
            .service
            .create_invoice(one_time(client.id, vec![LineItem::new("Design", dec!(1), eur)]))
            .await
            .unwrap();
        assert_eq!(invoice.currency(), Currency::EUR);
    }

    #[tokio::test]
    async fn test_deactivated_client_cannot_be_invoiced() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        h.service.deactivate_client(client.id).await.unwrap();

        let request = one_time(client.id, vec![LineItem::new("Design", dec!(1), usd(dec!(50)))]);
        let err = h.service.create_invoice(request).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_mark_sent_only_from_draft() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let invoice = h
            .service
            .create_invoice(one_time(client.id, vec![LineItem::new("Design", dec!(1), usd(dec!(50)))]))
            .await
            .unwrap();

        let sent = h.service.mark_sent(invoice.id).await.unwrap();
        assert_eq!(sent.status, InvoiceStatus::Sent);

        let again = h.service.mark_sent(invoice.id).await.unwrap_err();
        assert!(matches!(again, BillingError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_refresh_overdue_marks_only_sent_past_due() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let line = || vec![LineItem::new("Design", dec!(1), usd(dec!(50)))];

        let late = h.service.create_invoice(one_time(client.id, line())).await.unwrap();
        h.service.mark_sent(late.id).await.unwrap();
        let draft = h.service.create_invoice(one_time(client.id, line())).await.unwrap();
        let mut later_request = one_time(client.id, line());
        later_request.payment_terms = Some(PaymentTerms::Net90);
        let not_yet = h.service.create_invoice(later_request).await.unwrap();
        h.service.mark_sent(not_yet.id).await.unwrap();

        let updated = h.service.refresh_overdue_on(date(2024, 4, 15)).await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(h.service.get_invoice(late.id).await.unwrap().status, InvoiceStatus::Overdue);
        assert_eq!(h.service.get_invoice(draft.id).await.unwrap().status, InvoiceStatus::Draft);
        assert_eq!(h.service.get_invoice(not_yet.id).await.unwrap().status, InvoiceStatus::Sent);
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let h = Harness::on(date(2024, 3, 1));
        let err = h.service.get_invoice(InvoiceId::new()).await.unwrap_err();
        assert!(matches!(err, BillingError::InvoiceNotFound(_)));
    }
}

mod payments {
    use super::*;

    async fn sent_invoice(h: &Harness, total: Money) -> domain_billing::Invoice {
        let client = h.client("Initech").await;
        let invoice = h
            .service
            .create_invoice(one_time(client.id, vec![LineItem::new("Design", dec!(1), total)]))
            .await
            .unwrap();
        h.service.mark_sent(invoice.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let h = Harness::on(date(2024, 3, 1));
        let invoice = sent_invoice(&h, usd(dec!(300))).await;

        let first = h.service.record_payment(payment(invoice.id, usd(dec!(100)))).await.unwrap();
        assert_eq!(first.payment_number, "PAY-2024-0001");
        assert_eq!(first.paid_on, date(2024, 3, 1));
        let partially = h.service.get_invoice(invoice.id).await.unwrap();
        assert_eq!(partially.status, InvoiceStatus::Sent);
        assert_eq!(partially.balance_due(), usd(dec!(200)));

        let second = h.service.record_payment(payment(invoice.id, usd(dec!(200)))).await.unwrap();
        assert_eq!(second.payment_number, "PAY-2024-0002");
        let paid = h.service.get_invoice(invoice.id).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.balance_due().is_zero());
        assert_eq!(h.service.list_payments(invoice.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overdue_invoice_accepts_payment() {
        let h = Harness::on(date(2024, 3, 1));
        let invoice = sent_invoice(&h, usd(dec!(300))).await;
        h.service.refresh_overdue_on(date(2024, 5, 1)).await.unwrap();

        h.service.record_payment(payment(invoice.id, usd(dec!(300)))).await.unwrap();
        assert_eq!(h.service.get_invoice(invoice.id).await.unwrap().status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_rejected_payments() {
        let h = Harness::on(date(2024, 3, 1));
        let invoice = sent_invoice(&h, usd(dec!(300))).await;

        let zero = h.service.record_payment(payment(invoice.id, usd(dec!(0)))).await;
        assert!(matches!(zero, Err(BillingError::Validation(_))));

        let over = h.service.record_payment(payment(invoice.id, usd(dec!(300.01)))).await;
        assert!(matches!(over, Err(BillingError::Validation(_))));

        let foreign = payment(invoice.id, Money::new(dec!(10), Currency::GBP));
        assert!(matches!(
            h.service.record_payment(foreign).await,
            Err(BillingError::Money(_))
        ));

        assert!(h.service.list_payments(invoice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_draft_invoice_cannot_be_paid() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let draft = h
            .service
            .create_invoice(one_time(client.id, vec![LineItem::new("Design", dec!(1), usd(dec!(50)))]))
            .await
            .unwrap();

        let err = h.service.record_payment(payment(draft.id, usd(dec!(50)))).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidOperation(_)));
    }
}

mod expenses {
    use super::*;

    fn expense(amount: Money) -> CreateExpense {
        CreateExpense {
            description: "Conference tickets".to_string(),
            category: "travel".to_string(),
            amount,
            vendor: Some("EventCo".to_string()),
            client_id: None,
            incurred_on: Some(date(2024, 2, 12)),
        }
    }

    #[tokio::test]
    async fn test_expenses_are_numbered() {
        let h = Harness::on(date(2024, 3, 1));
        let first = h.service.create_expense(expense(usd(dec!(420)))).await.unwrap();
        let second = h.service.create_expense(expense(usd(dec!(80)))).await.unwrap();

        assert_eq!(first.expense_number, "EXP-2024-0001");
        assert_eq!(second.expense_number, "EXP-2024-0002");
        assert_eq!(h.service.list_expenses().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_expense_validation() {
        let h = Harness::on(date(2024, 3, 1));

        let negative = h.service.create_expense(expense(usd(dec!(-5)))).await;
        assert!(matches!(negative, Err(BillingError::Validation(_))));

        let mut billable = expense(usd(dec!(5)));
        billable.client_id = Some(ClientId::new());
        let err = h.service.create_expense(billable).await.unwrap_err();
        assert!(matches!(err, BillingError::ClientNotFound(_)));
    }
}

mod templates {
    use super::*;

    #[tokio::test]
    async fn test_create_template_validates() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;

        let zero = h.service.create_template(retainer(client.id, usd(dec!(0)))).await;
        assert!(matches!(zero, Err(BillingError::Validation(_))));

        let orphan = h
            .service
            .create_template(retainer(ClientId::new(), usd(dec!(100))))
            .await
            .unwrap_err();
        assert!(orphan.is_not_found());

        let template = h
            .service
            .create_template(retainer(client.id, usd(dec!(100))))
            .await
            .unwrap();
        assert!(template.is_active);
        assert!(template.last_fired_period.is_none());
    }

    #[tokio::test]
    async fn test_update_cannot_rewrite_firing_history() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let template = h
            .service
            .create_template(retainer(client.id, usd(dec!(100))))
            .await
            .unwrap();

        let patch = TemplatePatch {
            name: Some("Support plan".to_string()),
            last_fired_period: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        let updated = h.service.update_template(template.id, patch).await.unwrap();

        assert_eq!(updated.name, "Support plan");
        assert!(updated.last_fired_period.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_amount() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let template = h
            .service
            .create_template(retainer(client.id, usd(dec!(100))))
            .await
            .unwrap();

        let patch = TemplatePatch {
            amount: Some(usd(dec!(-1))),
            ..Default::default()
        };
        let err = h.service.update_template(template.id, patch).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let h = Harness::on(date(2024, 3, 1));
        let client = h.client("Initech").await;
        let template = h
            .service
            .create_template(retainer(client.id, usd(dec!(100))))
            .await
            .unwrap();

        let inactive = h.service.set_template_active(template.id, false).await.unwrap();
        assert!(!inactive.is_active);
        let active = h.service.set_template_active(template.id, true).await.unwrap();
        assert!(active.is_active);

        let missing = h
            .service
            .set_template_active(TemplateId::new(), true)
            .await
            .unwrap_err();
        assert!(matches!(missing, BillingError::TemplateNotFound(_)));
    }
}
