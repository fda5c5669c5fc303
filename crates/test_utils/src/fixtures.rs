//! Pre-built Test Fixtures
//!
//! Ready-to-use billing data for unit and integration tests. Values are
//! fixed so expected totals can be written down by hand; the `random_*`
//! helpers use `fake` where a test only needs something plausible.

use chrono::NaiveDate;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{ClientId, Currency, Money, Rate, TemplateId};
use domain_billing::{
    LineItem, NewClient, NumberingSettings, DocumentType, ShippingSelection, TaxSelection,
};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A standard USD amount
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Monthly retainer billed by the sample template
    pub fn usd_retainer() -> Money {
        Money::new(dec!(1500.00), Currency::USD)
    }

}

/// Fixture for calendar dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
    }

    /// The "today" most workflow tests run on
    pub fn today() -> NaiveDate {
        Self::date(2024, 3, 15)
    }

    /// End of a 31-day month, for clamping tests
    pub fn month_end() -> NaiveDate {
        Self::date(2024, 1, 31)
    }

    /// Leap day, for yearly clamping tests
    pub fn leap_day() -> NaiveDate {
        Self::date(2024, 2, 29)
    }
}

/// Fixture for line items and invoice extras
pub struct LineItemFixtures;

impl LineItemFixtures {
    /// 10.5 hours at 151.00
    pub fn consulting() -> LineItem {
        LineItem::new(
            "Consulting",
            dec!(10.5),
            Money::new(dec!(151.00), Currency::USD),
        )
    }

    /// 1 × 1500.00
    pub fn retainer() -> LineItem {
        LineItem::new("Monthly retainer", dec!(1), MoneyFixtures::usd_retainer())
    }

    /// 10% sales tax
    pub fn sales_tax() -> TaxSelection {
        TaxSelection {
            label: "Sales tax".to_string(),
            rate: Rate::from_percentage(dec!(10)),
        }
    }

    /// Flat 20.00 courier charge
    pub fn courier() -> ShippingSelection {
        ShippingSelection {
            label: "Courier".to_string(),
            amount: Money::new(dec!(20.00), Currency::USD),
        }
    }
}

/// Fixture for client data
pub struct ClientFixtures;

impl ClientFixtures {
    pub fn acme() -> NewClient {
        NewClient::new("Acme Corp")
            .with_email("billing@acme.example")
            .with_address("1 Market St, Springfield")
    }

    pub fn globex() -> NewClient {
        NewClient::new("Globex Inc").with_email("ap@globex.example")
    }

    /// A client with a generated company name and email
    pub fn random() -> NewClient {
        let name: String = CompanyName().fake();
        let email: String = SafeEmail().fake();
        NewClient::new(name).with_email(email)
    }
}

/// Fixture for numbering settings
pub struct NumberingFixtures;

impl NumberingFixtures {
    /// `BILL-000001` style: no year, six digits
    pub fn yearless_bill() -> NumberingSettings {
        NumberingSettings {
            prefix: "BILL".to_string(),
            padding_length: 6,
            include_year: false,
            ..NumberingSettings::defaults_for(DocumentType::Invoice)
        }
    }

    /// Sequence that keeps counting across years
    pub fn continuous(document_type: DocumentType) -> NumberingSettings {
        NumberingSettings {
            reset_on_new_year: false,
            ..NumberingSettings::defaults_for(document_type)
        }
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn invoice_number() -> &'static str {
        "INV-2024-0001"
    }

    /// A free-text note of a few words
    pub fn random_note() -> String {
        Sentence(3..8).fake()
    }
}

/// Fixture for deterministic identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn client_id() -> ClientId {
        ClientId::from_uuid(Uuid::from_u128(0x0100))
    }

    pub fn template_id() -> TemplateId {
        TemplateId::from_uuid(Uuid::from_u128(0x0200))
    }
}
