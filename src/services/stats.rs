use crate::database::models::{Shift, ShiftStats};
use crate::services::time_math::round_hours;

pub fn compute_shift_stats(shifts: &[Shift]) -> ShiftStats {
    let mut stats = ShiftStats {
        total_shifts: shifts.len(),
        ..ShiftStats::default()
    };

    let mut total_hours = 0.0_f64;
    let mut longest = 0.0_f64;

    for shift in shifts {
        let hours = shift.hours();
        total_hours += hours;
        longest = longest.max(hours);
        if shift.is_overnight() {
            stats.overnight_shifts += 1;
        }
        *stats
            .shifts_by_type
            .entry(shift.shift_type.to_string())
            .or_default() += 1;
        *stats
            .shifts_by_status
            .entry(shift.status.to_string())
            .or_default() += 1;
    }

    stats.total_hours = round_hours(total_hours);
    stats.longest_shift_hours = round_hours(longest);
    if !shifts.is_empty() {
        stats.average_shift_hours = round_hours(total_hours / shifts.len() as f64);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ShiftStatus, ShiftType};
    use crate::services::earnings::tests::shift;
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_input_gives_zeroes() {
        assert_eq!(compute_shift_stats(&[]), ShiftStats::default());
    }

    #[test]
    fn counts_and_averages() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let mut night = shift(day, time(22, 0), time(6, 0));
        night.shift_type = ShiftType::Night;
        let mut morning = shift(day, time(6, 0), time(10, 30));
        morning.shift_type = ShiftType::Morning;
        morning.status = ShiftStatus::Scheduled;

        let stats = compute_shift_stats(&[night, morning]);

        assert_eq!(stats.total_shifts, 2);
        assert_eq!(stats.total_hours, 12.5);
        assert_eq!(stats.average_shift_hours, 6.25);
        assert_eq!(stats.longest_shift_hours, 8.0);
        assert_eq!(stats.overnight_shifts, 1);
        assert_eq!(stats.shifts_by_type.get("night"), Some(&1));
        assert_eq!(stats.shifts_by_status.get("completed"), Some(&1));
        assert_eq!(stats.shifts_by_status.get("scheduled"), Some(&1));
    }
}
