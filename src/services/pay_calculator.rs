//! Tiered pay calculation.
//!
//! Worked hours are spread across a company's ordered tiers for one day
//! type. Each tier consumes up to its bound; an unbounded tier takes the
//! rest. Per-tier amounts are kept unrounded and the total is rounded once.

use serde::{Deserialize, Serialize};

use crate::database::models::{RateTier, RateTierInput};
use crate::error::PayError;
use crate::services::time_math::{format_minor_units, round_hours, round_minor_units, validate_hours};

/// Hours below this are treated as fully consumed.
const HOURS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierBreakdown {
    pub tier_order: i32,
    pub hours_in_tier: Option<f64>,
    pub hours_worked: f64,
    pub rate_per_hour: i64,
    /// Unrounded, in minor units
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayBreakdown {
    pub total_amount: i64,
    pub currency: String,
    pub hours_worked: f64,
    /// Hours left over once every bounded tier was exhausted
    pub unbilled_hours: f64,
    pub tiers: Vec<TierBreakdown>,
    pub explanation: String,
}

pub fn calculate_tiered_pay(
    hours: f64,
    tiers: &[RateTier],
    currency: &str,
) -> Result<PayBreakdown, PayError> {
    let hours = validate_hours(hours)?;

    if tiers.is_empty() {
        return Err(PayError::ConfigurationMissing(
            "no rate tiers configured".to_string(),
        ));
    }

    let mut ordered: Vec<&RateTier> = tiers.iter().collect();
    ordered.sort_by_key(|tier| tier.tier_order);

    let mut remaining = hours;
    let mut lines = Vec::new();

    for tier in ordered {
        if remaining <= HOURS_EPSILON {
            break;
        }

        let consumed = match tier.hours_in_tier {
            Some(bound) => remaining.min(bound.max(0.0)),
            None => remaining,
        };
        if consumed <= 0.0 {
            continue;
        }

        lines.push(TierBreakdown {
            tier_order: tier.tier_order,
            hours_in_tier: tier.hours_in_tier,
            hours_worked: consumed,
            rate_per_hour: tier.rate_per_hour,
            amount: consumed * tier.rate_per_hour as f64,
            currency: currency.to_string(),
        });
        remaining -= consumed;
    }

    let unbilled_hours = if remaining > HOURS_EPSILON { remaining } else { 0.0 };
    let total_amount = round_minor_units(lines.iter().map(|line| line.amount).sum());

    if unbilled_hours > 0.0 {
        log::warn!(
            "Tier capacity exhausted with {:.2}h left unbilled out of {:.2}h",
            unbilled_hours,
            hours
        );
    }

    let explanation = explain(&lines, total_amount, unbilled_hours, currency);

    Ok(PayBreakdown {
        total_amount,
        currency: currency.to_string(),
        hours_worked: hours,
        unbilled_hours,
        tiers: lines,
        explanation,
    })
}

fn explain(lines: &[TierBreakdown], total: i64, unbilled: f64, currency: &str) -> String {
    if lines.is_empty() {
        return format!("No hours worked, total {} {}", format_minor_units(total), currency);
    }

    let parts: Vec<String> = lines
        .iter()
        .map(|line| {
            format!(
                "tier {}: {:.2}h at {}/h = {}",
                line.tier_order,
                round_hours(line.hours_worked),
                format_minor_units(line.rate_per_hour),
                format_minor_units(round_minor_units(line.amount)),
            )
        })
        .collect();

    let mut explanation = format!(
        "{}; total {} {}",
        parts.join("; "),
        format_minor_units(total),
        currency
    );
    if unbilled > 0.0 {
        explanation.push_str(&format!(" ({:.2}h beyond the last tier not billed)", unbilled));
    }
    explanation
}

/// Checks a (company, day type) tier group before it is stored.
pub fn validate_tier_group(tiers: &[RateTierInput]) -> Result<(), PayError> {
    if tiers.is_empty() {
        return Err(PayError::InvalidTierSchedule(
            "at least one tier is required".to_string(),
        ));
    }

    let mut ordered: Vec<&RateTierInput> = tiers.iter().collect();
    ordered.sort_by_key(|tier| tier.tier_order);

    for (index, tier) in ordered.iter().enumerate() {
        let expected = index as i32 + 1;
        if tier.tier_order != expected {
            return Err(PayError::InvalidTierSchedule(format!(
                "tier orders must run 1..{} without gaps, found {} where {} was expected",
                ordered.len(),
                tier.tier_order,
                expected
            )));
        }

        if tier.rate_per_hour < 0 {
            return Err(PayError::InvalidTierSchedule(format!(
                "tier {} has a negative rate",
                tier.tier_order
            )));
        }

        match tier.hours_in_tier {
            Some(bound) if !bound.is_finite() || bound <= 0.0 => {
                return Err(PayError::InvalidTierSchedule(format!(
                    "tier {} must cover a positive number of hours",
                    tier.tier_order
                )));
            }
            None if index + 1 != ordered.len() => {
                return Err(PayError::InvalidTierSchedule(format!(
                    "only the last tier may be unbounded, tier {} is not last",
                    tier.tier_order
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::models::{DayType, ShiftCategory};
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    pub(crate) fn tier(order: i32, hours: Option<f64>, rate: i64) -> RateTier {
        RateTier {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            shift_category: ShiftCategory::Day,
            tier_order: order,
            hours_in_tier: hours,
            rate_per_hour: rate,
            day_type: DayType::Weekday,
            currency: "USD".to_string(),
            valid_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            valid_to: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(order: i32, hours: Option<f64>, rate: i64) -> RateTierInput {
        RateTierInput {
            tier_order: order,
            hours_in_tier: hours,
            rate_per_hour: rate,
            shift_category: None,
        }
    }

    #[test]
    fn ten_hour_weekday_shift_spills_into_second_tier() {
        let tiers = vec![tier(1, Some(8.0), 2500), tier(2, None, 3750)];
        let pay = calculate_tiered_pay(10.0, &tiers, "USD").unwrap();

        assert_eq!(pay.total_amount, 27500);
        assert_eq!(pay.tiers.len(), 2);
        assert_eq!(pay.tiers[0].hours_worked, 8.0);
        assert_eq!(pay.tiers[0].amount, 20000.0);
        assert_eq!(pay.tiers[1].hours_worked, 2.0);
        assert_eq!(pay.tiers[1].amount, 7500.0);
        assert_eq!(pay.unbilled_hours, 0.0);
        assert_eq!(
            pay.explanation,
            "tier 1: 8.00h at 25.00/h = 200.00; tier 2: 2.00h at 37.50/h = 75.00; total 275.00 USD"
        );
    }

    #[test]
    fn tiers_are_walked_in_order_regardless_of_input_order() {
        let tiers = vec![tier(2, None, 3750), tier(1, Some(8.0), 2500)];
        let pay = calculate_tiered_pay(10.0, &tiers, "USD").unwrap();
        assert_eq!(pay.tiers[0].tier_order, 1);
        assert_eq!(pay.total_amount, 27500);
    }

    #[test]
    fn short_shift_stays_in_first_tier() {
        let tiers = vec![tier(1, Some(8.0), 2500), tier(2, None, 3750)];
        let pay = calculate_tiered_pay(4.5, &tiers, "USD").unwrap();
        assert_eq!(pay.tiers.len(), 1);
        assert_eq!(pay.total_amount, 11250);
    }

    #[test]
    fn no_tiers_is_configuration_missing_not_zero() {
        let result = calculate_tiered_pay(6.0, &[], "USD");
        assert!(matches!(result, Err(PayError::ConfigurationMissing(_))));
    }

    #[test]
    fn zero_hours_is_zero_pay() {
        let tiers = vec![tier(1, None, 2500)];
        let pay = calculate_tiered_pay(0.0, &tiers, "USD").unwrap();
        assert_eq!(pay.total_amount, 0);
        assert!(pay.tiers.is_empty());
    }

    #[test]
    fn negative_or_nan_hours_are_rejected() {
        let tiers = vec![tier(1, None, 2500)];
        assert!(matches!(
            calculate_tiered_pay(-1.0, &tiers, "USD"),
            Err(PayError::InvalidDuration(_))
        ));
        assert!(matches!(
            calculate_tiered_pay(f64::NAN, &tiers, "USD"),
            Err(PayError::InvalidDuration(_))
        ));
    }

    #[test]
    fn hours_beyond_bounded_tiers_are_reported() {
        let tiers = vec![tier(1, Some(4.0), 2000), tier(2, Some(2.0), 3000)];
        let pay = calculate_tiered_pay(7.5, &tiers, "USD").unwrap();
        assert_eq!(pay.total_amount, 14000);
        assert_eq!(pay.unbilled_hours, 1.5);
        assert!(pay.explanation.contains("1.50h beyond the last tier"));
    }

    #[test]
    fn total_is_rounded_once() {
        // 3 x 1/3h at 1001 each: per-tier rounding would give 334 * 3 = 1002
        let third = 1.0 / 3.0;
        let tiers = vec![
            tier(1, Some(third), 1001),
            tier(2, Some(third), 1001),
            tier(3, None, 1001),
        ];
        let pay = calculate_tiered_pay(1.0, &tiers, "USD").unwrap();
        assert_eq!(pay.total_amount, 1001);
    }

    #[test]
    fn valid_group_passes() {
        let group = vec![input(1, Some(8.0), 2500), input(2, None, 3750)];
        assert_eq!(validate_tier_group(&group), Ok(()));
    }

    #[test]
    fn group_with_gap_is_rejected() {
        let group = vec![input(1, Some(8.0), 2500), input(3, None, 3750)];
        assert!(matches!(
            validate_tier_group(&group),
            Err(PayError::InvalidTierSchedule(_))
        ));
    }

    #[test]
    fn unbounded_tier_must_be_last() {
        let group = vec![input(1, None, 2500), input(2, Some(2.0), 3750)];
        assert!(validate_tier_group(&group).is_err());
    }

    #[test]
    fn bounds_and_rates_must_be_sane() {
        assert!(validate_tier_group(&[input(1, Some(0.0), 2500)]).is_err());
        assert!(validate_tier_group(&[input(1, None, -5)]).is_err());
        assert!(validate_tier_group(&[]).is_err());
    }
}
