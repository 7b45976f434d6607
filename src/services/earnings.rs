//! Flat-rate earnings for one employee over a date range.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::database::models::{EmployeeRate, RateCategory, Shift};
use crate::services::day_type::{HolidayLookup, classify_day, rate_category};
use crate::services::time_math::{round_hours, round_minor_units};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsLine {
    pub category: RateCategory,
    pub hours: f64,
    pub rate: i64,
    pub earnings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_earnings: i64,
    pub total_hours: f64,
    pub currency: String,
    /// False when the employee has no rate record at all
    pub rates_configured: bool,
    /// Hours on dates no rate record covers
    pub unrated_hours: f64,
    pub shift_count: usize,
    pub breakdown: Vec<EarningsLine>,
}

/// Sums shift hours per rate category and prices them at the employee's
/// flat rates. `rates` may hold several records with different validity
/// windows; each shift uses the one covering its date. Rejected shifts are
/// skipped.
pub fn aggregate_earnings(
    shifts: &[Shift],
    rates: &[EmployeeRate],
    holidays: &impl HolidayLookup,
    night_cutoff: NaiveTime,
    default_currency: &str,
) -> EarningsSummary {
    let currency = rates
        .first()
        .map(|rate| rate.currency.clone())
        .unwrap_or_else(|| default_currency.to_string());

    let mut buckets: BTreeMap<(RateCategory, i64), f64> = BTreeMap::new();
    let mut total_hours = 0.0;
    let mut unrated_hours = 0.0;
    let mut shift_count = 0;

    for shift in shifts.iter().filter(|shift| shift.status.is_payable()) {
        shift_count += 1;
        let hours = shift.hours();
        total_hours += hours;

        let Some(rate) = rates.iter().find(|rate| rate.covers(shift.shift_date)) else {
            unrated_hours += hours;
            continue;
        };

        let day_type = classify_day(shift.shift_date, holidays);
        let category = rate_category(day_type, shift.start_time, night_cutoff);
        *buckets.entry((category, rate.rate_for(category))).or_insert(0.0) += hours;
    }

    let breakdown: Vec<EarningsLine> = buckets
        .into_iter()
        .map(|((category, rate), hours)| EarningsLine {
            category,
            hours: round_hours(hours),
            rate,
            earnings: round_minor_units(hours * rate as f64),
        })
        .collect();

    EarningsSummary {
        total_earnings: breakdown.iter().map(|line| line.earnings).sum(),
        total_hours: round_hours(total_hours),
        currency,
        rates_configured: !rates.is_empty(),
        unrated_hours: round_hours(unrated_hours),
        shift_count,
        breakdown,
    }
}
