//! Custom Test Assertions
//!
//! Assertion helpers for billing types that give more meaningful failure
//! messages than a bare `assert_eq!` on large structs.

use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_billing::{Invoice, InvoiceStatus, ProcessingReport};

/// Asserts that a Money value has the given amount and currency
pub fn assert_money_eq(actual: &Money, amount: Decimal, currency: Currency) {
    assert_eq!(
        actual.currency(),
        currency,
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        currency
    );
    assert_eq!(
        actual.amount(),
        amount,
        "Amount mismatch: actual={}, expected={}",
        actual.amount(),
        amount
    );
}

/// Asserts that an invoice's totals add up and every line is consistent
///
/// # Panics
///
/// Panics if `amount != subtotal + tax + shipping`, if the subtotal is not
/// the sum of the line totals, or if a line total disagrees with its
/// quantity and unit price.
pub fn assert_invoice_consistent(invoice: &Invoice) {
    for item in &invoice.line_items {
        assert!(
            item.is_consistent(),
            "Line '{}' total {} != {} x {}",
            item.description,
            item.line_total.amount(),
            item.quantity,
            item.unit_price.amount()
        );
    }

    let lines: Decimal = invoice.line_items.iter().map(|i| i.line_total.amount()).sum();
    assert_eq!(
        invoice.subtotal.amount(),
        lines,
        "Invoice {} subtotal does not match its lines",
        invoice.invoice_number
    );

    let expected = invoice.subtotal.amount() + invoice.tax_amount.amount() + invoice.shipping_amount.amount();
    assert_eq!(
        invoice.amount.amount(),
        expected,
        "Invoice {} total {} != subtotal {} + tax {} + shipping {}",
        invoice.invoice_number,
        invoice.amount.amount(),
        invoice.subtotal.amount(),
        invoice.tax_amount.amount(),
        invoice.shipping_amount.amount()
    );
}

/// Asserts an invoice's status
pub fn assert_invoice_status(invoice: &Invoice, expected: InvoiceStatus) {
    assert_eq!(
        invoice.status, expected,
        "Invoice {} is {:?}, expected {:?}",
        invoice.invoice_number, invoice.status, expected
    );
}

/// Asserts that invoice numbers are unique
pub fn assert_unique_numbers(invoices: &[Invoice]) {
    let mut numbers: Vec<&str> = invoices.iter().map(|i| i.invoice_number.as_str()).collect();
    numbers.sort_unstable();
    let total = numbers.len();
    numbers.dedup();
    assert_eq!(numbers.len(), total, "Duplicate invoice numbers in {:?}", numbers);
}

/// Asserts a recurring run fired `fired` invoices without failures
pub fn assert_clean_run(report: &ProcessingReport, fired: usize) {
    assert!(
        !report.has_failures(),
        "Recurring run had failures: {:?}",
        report.failures
    );
    assert_eq!(
        report.fired_count(),
        fired,
        "Expected {} fired invoices, got {:?}",
        fired,
        report.fired
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::InvoiceBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_eq_passes() {
        assert_money_eq(&Money::new(dec!(10.00), Currency::USD), dec!(10), Currency::USD);
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_assert_money_eq_currency_mismatch() {
        assert_money_eq(&Money::new(dec!(10.00), Currency::EUR), dec!(10), Currency::USD);
    }

    #[test]
    fn test_built_invoice_is_consistent() {
        assert_invoice_consistent(&InvoiceBuilder::new().build());
    }

    #[test]
    #[should_panic(expected = "Duplicate invoice numbers")]
    fn test_duplicate_numbers_detected() {
        let a = InvoiceBuilder::new().with_number("INV-2024-0001").build();
        let b = InvoiceBuilder::new().with_number("INV-2024-0001").build();
        assert_unique_numbers(&[a, b]);
    }
}
