//! Tests for calendar arithmetic and clocks

use chrono::{Datelike, NaiveDate};
use core_kernel::{add_months, Clock, FixedClock, SystemClock, Timezone};
use core_kernel::temporal::CalendarError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod month_arithmetic {
    use super::*;

    #[test]
    fn test_jan_31_plus_one_month_in_common_year() {
        assert_eq!(add_months(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn test_year_rollover() {
        assert_eq!(add_months(date(2024, 11, 15), 3).unwrap(), date(2025, 2, 15));
    }

    #[test]
    fn test_feb_29_plus_twelve_months() {
        assert_eq!(add_months(date(2024, 2, 29), 12).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_out_of_range() {
        let result = add_months(NaiveDate::MAX, 1);
        assert!(matches!(result, Err(CalendarError::OutOfRange { .. })));
    }
}

mod clocks {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_date() {
        let clock = FixedClock::new(date(2024, 6, 15));
        assert_eq!(clock.today(), date(2024, 6, 15));
        assert_eq!(clock.current_year(), 2024);
    }

    #[test]
    fn test_system_clock_is_close_to_utc_today() {
        let clock = SystemClock::new(Timezone::default());
        let utc_today = chrono::Utc::now().date_naive();
        let diff = (clock.today() - utc_today).num_days().abs();
        assert!(diff <= 1);
    }

    #[test]
    fn test_timezone_parse_and_serialize() {
        let tz: Timezone = "Europe/Berlin".parse().unwrap();
        assert_eq!(serde_json::to_string(&tz).unwrap(), "\"Europe/Berlin\"");
        assert!("Not/AZone".parse::<Timezone>().is_err());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn add_months_never_goes_backwards_and_lands_in_target_month(
            y in 1970i32..2200,
            m in 1u32..=12,
            d in 1u32..=28,
            n in 0u32..48
        ) {
            let start = date(y, m, d);
            let next = add_months(start, n).unwrap();
            prop_assert!(next >= start);
            let months_between = (next.year() - start.year()) * 12 + next.month() as i32 - start.month() as i32;
            prop_assert_eq!(months_between, n as i32);
        }
    }
}
