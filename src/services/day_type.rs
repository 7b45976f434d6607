//! Calendar and time-of-day classification of shifts.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::collections::BTreeMap;

use crate::database::models::{DayType, PublicHoliday, RateCategory, ShiftType};

/// Anything that can answer "is this date a registered public holiday".
pub trait HolidayLookup {
    fn is_holiday(&self, date: NaiveDate) -> bool;
    fn describe(&self, date: NaiveDate) -> Option<&str>;
}

/// Holidays for a bounded span of dates, loaded up front so classification
/// stays synchronous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, description: impl Into<String>) {
        self.days.insert(date, description.into());
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &String)> {
        self.days.iter()
    }
}

impl FromIterator<PublicHoliday> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = PublicHoliday>>(iter: I) -> Self {
        Self {
            days: iter
                .into_iter()
                .map(|h| (h.holiday_date, h.description))
                .collect(),
        }
    }
}

impl Extend<(NaiveDate, String)> for HolidayCalendar {
    fn extend<I: IntoIterator<Item = (NaiveDate, String)>>(&mut self, iter: I) {
        self.days.extend(iter);
    }
}

impl HolidayLookup for HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    fn describe(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }
}

/// Holiday first, then ISO weekday. Time of day never matters.
pub fn classify_day(date: NaiveDate, holidays: &impl HolidayLookup) -> DayType {
    if holidays.is_holiday(date) {
        return DayType::Holiday;
    }

    match date.weekday() {
        Weekday::Sat => DayType::Saturday,
        Weekday::Sun => DayType::Sunday,
        _ => DayType::Weekday,
    }
}

/// A shift is a night shift when it starts at or after the cutoff.
pub fn is_night_start(start: NaiveTime, night_cutoff: NaiveTime) -> bool {
    start >= night_cutoff
}

/// Shift type implied by the start time when the user did not pick one.
pub fn suggest_shift_type(start: NaiveTime, night_cutoff: NaiveTime) -> ShiftType {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    if is_night_start(start, night_cutoff) {
        ShiftType::Night
    } else if start < noon {
        ShiftType::Morning
    } else {
        ShiftType::Evening
    }
}

/// Flat-rate bucket for a shift. Weeknight only splits weekdays; weekends
/// and holidays have a single rate regardless of start time.
pub fn rate_category(day_type: DayType, start: NaiveTime, night_cutoff: NaiveTime) -> RateCategory {
    match day_type {
        DayType::Holiday => RateCategory::PublicHoliday,
        DayType::Saturday => RateCategory::Saturday,
        DayType::Sunday => RateCategory::Sunday,
        DayType::Weekday if is_night_start(start, night_cutoff) => RateCategory::Weeknight,
        DayType::Weekday => RateCategory::Weekday,
    }
}
