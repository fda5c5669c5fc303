//! Document numbering tests

mod common;

use proptest::prelude::*;
use serde_json::json;

use domain_billing::{
    generate, parse, DocumentType, NumberingSettings, ParsedNumber,
};

use common::{date, Harness};

fn settings(prefix: &str, padding_length: usize, include_year: bool) -> NumberingSettings {
    NumberingSettings {
        prefix: prefix.to_string(),
        start_number: 1,
        padding_length,
        include_year,
        reset_on_new_year: true,
    }
}

mod formatting {
    use super::*;

    #[test]
    fn test_generate_examples() {
        assert_eq!(generate(&settings("INV", 4, true), 7, Some(2024)), "INV-2024-0007");
        assert_eq!(generate(&settings("INV", 4, false), 7, None), "INV-0007");
        assert_eq!(generate(&settings("INV", 2, false), 12345, None), "INV-12345");
        assert_eq!(generate(&settings("PAY", 0, true), 3, Some(2025)), "PAY-2025-3");
    }

    #[test]
    fn test_include_year_without_year_omits_segment() {
        assert_eq!(generate(&settings("EXP", 3, true), 9, None), "EXP-009");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for text in ["inv_2024_1", "INV-24-0001", "", "INV-2024-0001-2", "INV 0001", "-0001"] {
            assert_eq!(parse(text), ParsedNumber::default(), "{text:?}");
        }
    }

    #[test]
    fn test_parse_sequence_overflow_is_empty() {
        assert!(parse("INV-99999999999999999999999").is_empty());
    }
}

mod properties {
    use super::*;

    proptest! {
        #[test]
        fn prop_generate_parse_round_trip(
            prefix in "[A-Za-z]{1,8}",
            sequence in 0u64..10_000_000_000,
            year in 1000i32..=9999,
            padding in 0usize..=12,
        ) {
            let settings = settings(&prefix, padding, true);
            let parsed = parse(&generate(&settings, sequence, Some(year)));
            prop_assert_eq!(parsed, ParsedNumber {
                prefix: Some(prefix),
                year: Some(year),
                sequence: Some(sequence),
            });
        }

        #[test]
        fn prop_generate_never_truncates(
            sequence in any::<u64>(),
            padding in 0usize..=12,
        ) {
            let text = generate(&settings("INV", padding, false), sequence, None);
            let digits = text.trim_start_matches("INV-");
            prop_assert!(digits.len() >= padding);
            prop_assert!(digits.len() >= sequence.to_string().len());
            prop_assert_eq!(digits.parse::<u64>().unwrap(), sequence);
        }
    }
}

mod next_number {
    use super::*;

    #[tokio::test]
    async fn test_first_number_uses_start_and_current_year() {
        let h = Harness::on(date(2024, 5, 1));
        let number = h.service.numbers().next(DocumentType::Invoice, None).await;
        assert_eq!(number, "INV-2024-0001");
    }

    #[tokio::test]
    async fn test_new_year_resets_sequence() {
        let h = Harness::on(date(2024, 1, 2));
        let number = h
            .service
            .numbers()
            .next(DocumentType::Invoice, Some("INV-2023-0042"))
            .await;
        assert_eq!(number, "INV-2024-0001");
    }

    #[tokio::test]
    async fn test_same_year_increments() {
        let h = Harness::on(date(2024, 8, 9));
        let number = h
            .service
            .numbers()
            .next(DocumentType::Invoice, Some("INV-2024-0042"))
            .await;
        assert_eq!(number, "INV-2024-0043");
    }

    #[tokio::test]
    async fn test_without_reset_sequence_continues_into_new_year() {
        let h = Harness::on(date(2024, 1, 2));
        h.settings
            .insert_raw("numbering.invoice", json!({"resetOnNewYear": false}))
            .await;

        let number = h
            .service
            .numbers()
            .next(DocumentType::Invoice, Some("INV-2023-0042"))
            .await;
        assert_eq!(number, "INV-2024-0043");
    }

    #[tokio::test]
    async fn test_unparsable_previous_number_restarts() {
        let h = Harness::on(date(2024, 5, 1));
        h.settings
            .insert_raw("numbering.invoice", json!({"startNumber": 100}))
            .await;

        let number = h
            .service
            .numbers()
            .next(DocumentType::Invoice, Some("legacy#17"))
            .await;
        assert_eq!(number, "INV-2024-0100");
    }

    #[tokio::test]
    async fn test_yearless_numbers_increment() {
        let h = Harness::on(date(2024, 5, 1));
        h.settings
            .insert_raw("numbering.expense", json!({"includeYear": false}))
            .await;

        let number = h
            .service
            .numbers()
            .next(DocumentType::Expense, Some("EXP-0009"))
            .await;
        assert_eq!(number, "EXP-0010");
    }

    #[tokio::test]
    async fn test_settings_store_outage_uses_defaults() {
        let h = Harness::on(date(2024, 5, 1));
        h.settings.set_unavailable(true);

        let number = h
            .service
            .numbers()
            .next(DocumentType::Payment, Some("PAY-2024-0007"))
            .await;
        assert_eq!(number, "PAY-2024-0008");
    }

    #[tokio::test]
    async fn test_next_for_reads_latest_number_from_store() {
        let h = Harness::on(date(2024, 5, 1));
        let numbers = h.service.numbers();

        assert_eq!(numbers.next_for(DocumentType::Payment).await.unwrap(), "PAY-2024-0001");
        assert_eq!(numbers.next_for(DocumentType::Expense).await.unwrap(), "EXP-2024-0001");
    }

    #[tokio::test]
    async fn test_resolver_set_changes_future_numbers() {
        let h = Harness::on(date(2024, 5, 1));
        let custom = NumberingSettings {
            prefix: "BILL".to_string(),
            padding_length: 6,
            include_year: false,
            ..NumberingSettings::defaults_for(DocumentType::Invoice)
        };
        h.service
            .numbering()
            .set(DocumentType::Invoice, custom)
            .await
            .unwrap();

        let number = h.service.numbers().next(DocumentType::Invoice, None).await;
        assert_eq!(number, "BILL-000001");
    }
}
