//! Calendar arithmetic and the business clock
//!
//! Billing decisions are made on calendar dates, never on instants: a
//! template is due when its scheduled date is on or before *today* in the
//! business's timezone. [`Clock`] makes "today" injectable so schedulers and
//! tests agree on what day it is.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors related to calendar arithmetic
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Date out of range: {date} plus {months} months")]
    OutOfRange {
        date: NaiveDate,
        months: u32,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// IANA timezone wrapper with string serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// The calendar date of the given instant in this timezone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timezone {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| CalendarError::UnknownTimezone(s.to_string()))
    }
}

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of the current business date
pub trait Clock: Send + Sync + fmt::Debug {
    /// Today's calendar date, time-of-day discarded
    fn today(&self) -> NaiveDate;

    /// The current year, used by document numbering
    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Wall clock evaluated in a fixed business timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Timezone,
}

impl SystemClock {
    pub fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }

    /// Shared handle, as expected by services
    pub fn shared(timezone: Timezone) -> Arc<dyn Clock> {
        Arc::new(Self::new(timezone))
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.timezone.date_of(Utc::now())
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn shared(date: NaiveDate) -> Arc<dyn Clock> {
        Arc::new(Self::new(date))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }
}

/// Adds calendar months, clamping to the last day of the target month
///
/// Jan 31 + 1 month is Feb 29 in a leap year and Feb 28 otherwise.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CalendarError> {
    date.checked_add_months(Months::new(months))
        .ok_or(CalendarError::OutOfRange { date, months })
}
