//! Property-Based Test Generators
//!
//! Proptest strategies for billing data that respect the domain's own
//! constraints (letters-only prefixes, bounded padding, representable dates).

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_billing::{Frequency, LineItem, NumberingSettings, PaymentTerms};

/// Strategy for positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for positive USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for line quantities with up to two decimal places
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for USD line items
pub fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    ("[A-Za-z ]{1,24}", quantity_strategy(), usd_money_strategy())
        .prop_map(|(description, quantity, price)| LineItem::new(description, quantity, price))
}

/// Strategy for letters-only numbering prefixes
pub fn prefix_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,8}"
}

/// Strategy for numbering settings that pass validation
pub fn numbering_settings_strategy() -> impl Strategy<Value = NumberingSettings> {
    (prefix_strategy(), 0u64..10_000, 0usize..=12, any::<bool>(), any::<bool>()).prop_map(
        |(prefix, start_number, padding_length, include_year, reset_on_new_year)| NumberingSettings {
            prefix,
            start_number,
            padding_length,
            include_year,
            reset_on_new_year,
        },
    )
}

/// Strategy for template frequencies
pub fn frequency_strategy() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Weekly),
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::Yearly),
    ]
}

/// Strategy for payment terms
pub fn payment_terms_strategy() -> impl Strategy<Value = PaymentTerms> {
    prop_oneof![
        Just(PaymentTerms::DueOnReceipt),
        Just(PaymentTerms::Net15),
        Just(PaymentTerms::Net30),
        Just(PaymentTerms::Net60),
        Just(PaymentTerms::Net90),
    ]
}

/// Strategy for calendar dates between 2000 and 2099, month ends included
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid calendar date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}
