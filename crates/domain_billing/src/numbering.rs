//! Document numbering
//!
//! Invoices, expenses and payments each carry a human-readable number such
//! as `INV-2024-0007`. This module holds the per-type configuration and the
//! pure formatting and parsing functions; resolving the *next* number lives
//! in [`crate::next_number`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;

/// Upper bound accepted by [`NumberingSettings::validate`]
pub const MAX_PADDING_LENGTH: usize = 12;

static WITH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)-(\d{4})-(\d+)$").expect("valid pattern"));
static WITHOUT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)-(\d+)$").expect("valid pattern"));

/// Kinds of numbered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Expense,
    Payment,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [DocumentType::Invoice, DocumentType::Expense, DocumentType::Payment];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Expense => "expense",
            DocumentType::Payment => "payment",
        }
    }

    /// Settings-store key holding this type's numbering configuration
    pub fn settings_key(&self) -> String {
        format!("numbering.{}", self.as_str())
    }

    fn default_prefix(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INV",
            DocumentType::Expense => "EXP",
            DocumentType::Payment => "PAY",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BillingError::validation(format!("unknown document type '{s}'")))
    }
}

/// Numbering configuration for one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingSettings {
    /// Letters-only prefix, e.g. `INV`
    pub prefix: String,
    /// First sequence value, and the value a yearly reset restarts at
    pub start_number: u64,
    /// Minimum digit count of the sequence
    pub padding_length: usize,
    pub include_year: bool,
    pub reset_on_new_year: bool,
}

impl NumberingSettings {
    /// Built-in settings used when nothing is persisted for the type
    pub fn defaults_for(document_type: DocumentType) -> Self {
        Self {
            prefix: document_type.default_prefix().to_string(),
            start_number: 1,
            padding_length: 4,
            include_year: true,
            reset_on_new_year: true,
        }
    }

    /// Checks that numbers generated with these settings will parse back
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.prefix.is_empty() || !self.prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BillingError::validation(format!(
                "prefix '{}' must contain letters only",
                self.prefix
            )));
        }
        if self.padding_length > MAX_PADDING_LENGTH {
            return Err(BillingError::validation(format!(
                "padding length {} exceeds {}",
                self.padding_length, MAX_PADDING_LENGTH
            )));
        }
        Ok(())
    }
}

/// Partially-specified settings as they may sit in the settings store
///
/// Each present field overrides the defaults; absent fields keep them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingSettingsPatch {
    pub prefix: Option<String>,
    pub start_number: Option<u64>,
    pub padding_length: Option<usize>,
    pub include_year: Option<bool>,
    pub reset_on_new_year: Option<bool>,
}

impl NumberingSettingsPatch {
    pub fn apply_to(self, mut base: NumberingSettings) -> NumberingSettings {
        if let Some(prefix) = self.prefix {
            base.prefix = prefix;
        }
        if let Some(start) = self.start_number {
            base.start_number = start;
        }
        if let Some(padding) = self.padding_length {
            base.padding_length = padding;
        }
        if let Some(include_year) = self.include_year {
            base.include_year = include_year;
        }
        if let Some(reset) = self.reset_on_new_year {
            base.reset_on_new_year = reset;
        }
        base
    }
}

/// Result of [`parse`]; every field is `None` when the text has no recognised shape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNumber {
    pub prefix: Option<String>,
    pub year: Option<i32>,
    pub sequence: Option<u64>,
}

impl ParsedNumber {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.year.is_none() && self.sequence.is_none()
    }
}

/// Formats a document number
///
/// The sequence is zero-padded to `padding_length` and never truncated. The
/// year segment is written only when `include_year` is set and a year is
/// supplied: `PREFIX-YYYY-NNNN`, otherwise `PREFIX-NNNN`.
pub fn generate(settings: &NumberingSettings, sequence: u64, year: Option<i32>) -> String {
    let width = settings.padding_length;
    match year {
        Some(year) if settings.include_year => {
            format!("{}-{}-{:0>width$}", settings.prefix, year, sequence)
        }
        _ => format!("{}-{:0>width$}", settings.prefix, sequence),
    }
}

/// Parses `LETTERS-YYYY-DIGITS` or `LETTERS-DIGITS`
///
/// Any other shape, including a sequence too large for `u64`, yields an empty
/// [`ParsedNumber`].
pub fn parse(text: &str) -> ParsedNumber {
    if let Some(caps) = WITH_YEAR.captures(text) {
        let year = caps[2].parse::<i32>().ok();
        let sequence = caps[3].parse::<u64>().ok();
        if let (Some(year), Some(sequence)) = (year, sequence) {
            return ParsedNumber {
                prefix: Some(caps[1].to_string()),
                year: Some(year),
                sequence: Some(sequence),
            };
        }
        return ParsedNumber::default();
    }

    if let Some(caps) = WITHOUT_YEAR.captures(text) {
        if let Ok(sequence) = caps[2].parse::<u64>() {
            return ParsedNumber {
                prefix: Some(caps[1].to_string()),
                year: None,
                sequence: Some(sequence),
            };
        }
    }

    ParsedNumber::default()
}
