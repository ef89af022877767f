//! Utility functions for timestamp encoding and formatting
use std::time::Duration;

use time::macros::format_description;
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::error::ClockError;

/// Encode a local date-time as the integer whose decimal digits read
/// `YYYYMMDDHHMMSS`, e.g. 2024-03-05 14:07:09 -> 20240305140709.
///
/// This is not a Unix epoch; receivers parse the digits back with
/// `%Y%m%d%H%M%S`. Years before 0 cannot be written with four digits and
/// are reported as an error rather than corrected.
pub fn encode_timestamp(dt: &PrimitiveDateTime) -> Result<u64, ClockError> {
    let year = u64::try_from(dt.year())
        .ok()
        .filter(|year| *year <= 9999)
        .ok_or(ClockError { year: dt.year() })?;

    Ok(year * 10_000_000_000
        + u64::from(u8::from(dt.month())) * 100_000_000
        + u64::from(dt.day()) * 1_000_000
        + u64::from(dt.hour()) * 10_000
        + u64::from(dt.minute()) * 100
        + u64::from(dt.second()))
}

/// Parse a `YYYYMMDDHHMMSS` integer back into a date-time
///
/// Returns None when any digit group is out of range for a calendar date.
pub fn decode_timestamp(value: u64) -> Option<PrimitiveDateTime> {
    let second = (value % 100) as u8;
    let minute = (value / 100 % 100) as u8;
    let hour = (value / 10_000 % 100) as u8;
    let day = (value / 1_000_000 % 100) as u8;
    let month = (value / 100_000_000 % 100) as u8;
    let year = i32::try_from(value / 10_000_000_000).ok()?;

    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

/// Format a timestamp for human-readable logging
///
/// Converts a date-time to DD.MM.YYYY - HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &PrimitiveDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

/// Render a wire timestamp for logs, or the raw integer if it is not a date
pub fn format_wire_timestamp(value: u64) -> String {
    match decode_timestamp(value) {
        Some(dt) => format_datetime(&dt),
        None => value.to_string(),
    }
}

/// Extra delay after `failures` consecutive connect failures
///
/// Doubles from `base` on every failure and never exceeds `max`.
/// A zero `max` disables backoff.
pub fn backoff_delay(base: Duration, failures: u32, max: Duration) -> Duration {
    if failures == 0 || max.is_zero() {
        return Duration::ZERO;
    }

    let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_encode_timestamp_digits() {
        let dt = datetime!(2024-03-05 14:07:09);
        assert_eq!(encode_timestamp(&dt).unwrap(), 20240305140709);
    }

    #[test]
    fn test_encode_timestamp_extremes() {
        assert_eq!(
            encode_timestamp(&datetime!(9999-12-31 23:59:59)).unwrap(),
            99991231235959
        );
        assert_eq!(
            encode_timestamp(&datetime!(0000-01-01 00:00:00)).unwrap(),
            101000000
        );
    }

    #[test]
    fn test_encode_timestamp_negative_year() {
        let dt = Date::from_calendar_date(-1, Month::June, 1)
            .unwrap()
            .with_hms(12, 0, 0)
            .unwrap();
        let err = encode_timestamp(&dt).unwrap_err();
        assert_eq!(err.year, -1);
    }

    #[test]
    fn test_decode_timestamp() {
        assert_eq!(
            decode_timestamp(20240305140709),
            Some(datetime!(2024-03-05 14:07:09))
        );
        assert_eq!(decode_timestamp(20241305140709), None); // month 13
        assert_eq!(decode_timestamp(20240230000000), None); // Feb 30
        assert_eq!(decode_timestamp(20240305250000), None); // hour 25
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(
            format_datetime(&datetime!(2024-03-05 14:07:09)),
            "05.03.2024 - 14:07:09"
        );
        assert_eq!(format_wire_timestamp(20240305140709), "05.03.2024 - 14:07:09");
        assert_eq!(format_wire_timestamp(42), "42");
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_secs(5);
        let max = Duration::from_secs(60);

        assert_eq!(backoff_delay(base, 0, max), Duration::ZERO);
        assert_eq!(backoff_delay(base, 1, max), Duration::from_secs(5));
        assert_eq!(backoff_delay(base, 2, max), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 4, max), Duration::from_secs(40));
        assert_eq!(backoff_delay(base, 5, max), max);
        assert_eq!(backoff_delay(base, 40, max), max);
        assert_eq!(backoff_delay(base, 3, Duration::ZERO), Duration::ZERO);
    }
}
