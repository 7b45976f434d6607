//! Wall-clock arithmetic shared by every shift computation.
//!
//! Contract:
//! - times are local wall-clock `HH:MM` (seconds accepted and kept),
//! - an end time earlier than the start time means the shift ran past
//!   midnight, so 24 hours are added,
//! - an end time equal to the start time is a zero-length shift,
//! - hours are `minutes / 60` and are never rounded here; callers round
//!   only for display via [`round_hours`],
//! - money is rounded once, half-up, via [`round_minor_units`].

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::error::PayError;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, PayError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| PayError::InvalidTime(value.to_string()))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

/// Minutes between `start` and `end`, wrapping past midnight.
pub fn shift_duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let seconds = (end - start).num_seconds();
    let minutes = seconds.div_euclid(60);
    if minutes < 0 {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

pub fn shift_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    shift_duration_minutes(start, end) as f64 / 60.0
}

/// Two-decimal hours for display.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Rounds an amount in minor currency units to the nearest unit, halves up.
///
/// Amounts here are never negative, so `f64::round` (half away from zero)
/// is half-up. A tiny epsilon absorbs binary representation error such as
/// `x.4999999999` produced by products of decimal inputs.
pub fn round_minor_units(amount: f64) -> i64 {
    (amount + 1e-9).round() as i64
}

/// Renders minor units as a two-decimal major amount, e.g. `27500` → `275.00`.
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub fn validate_hours(hours: f64) -> Result<f64, PayError> {
    if !hours.is_finite() {
        return Err(PayError::InvalidDuration(format!(
            "worked hours must be finite, got {}",
            hours
        )));
    }
    if hours < 0.0 {
        return Err(PayError::InvalidDuration(format!(
            "worked hours must not be negative, got {}",
            hours
        )));
    }
    Ok(hours)
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), PayError> {
    if end < start {
        return Err(PayError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Serde adapter storing `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t(s: &str) -> NaiveTime {
        parse_hhmm(s).unwrap()
    }

    #[test]
    fn overnight_shift_wraps_past_midnight() {
        assert_eq!(shift_hours(t("22:00"), t("02:00")), 4.0);
        assert_eq!(shift_duration_minutes(t("23:30"), t("00:15")), 45);
    }

    #[test]
    fn same_day_shift() {
        assert_eq!(shift_hours(t("09:00"), t("17:30")), 8.5);
    }

    #[test]
    fn equal_start_and_end_is_zero_length() {
        assert_eq!(shift_duration_minutes(t("08:00"), t("08:00")), 0);
    }

    #[test]
    fn parses_with_or_without_seconds() {
        assert_eq!(t("07:05"), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(t("07:05:30"), NaiveTime::from_hms_opt(7, 5, 30).unwrap());
        assert!(matches!(parse_hhmm("7pm"), Err(PayError::InvalidTime(_))));
        assert!(parse_hhmm("24:00").is_err());
    }

    #[test]
    fn formats_round_trip_without_seconds() {
        assert_eq!(format_hhmm(t("06:00")), "06:00");
        assert_eq!(format_hhmm(t("06:00:15")), "06:00:15");
    }

    #[test]
    fn money_rounds_half_up() {
        assert_eq!(round_minor_units(12.5), 13);
        assert_eq!(round_minor_units(12.49), 12);
        assert_eq!(round_minor_units(20833.333), 20833);
        // 1.005 * 100 is 100.49999999999999 in binary
        assert_eq!(round_minor_units(1.005 * 100.0), 101);
    }

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_minor_units(27500), "275.00");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(-150), "-1.50");
    }

    #[test]
    fn rejects_bad_hours() {
        assert!(validate_hours(-0.5).is_err());
        assert!(validate_hours(f64::NAN).is_err());
        assert!(validate_hours(f64::INFINITY).is_err());
        assert_eq!(validate_hours(0.0), Ok(0.0));
    }

    #[test]
    fn date_range_must_not_run_backwards() {
        let a = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 5, 7).unwrap();
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(a, a).is_ok());
        assert_eq!(
            validate_date_range(b, a),
            Err(PayError::InvalidDateRange { start: b, end: a })
        );
    }
}
