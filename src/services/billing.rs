//! Prices shifts against a company's tiered rates.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{DayType, RateTier, Shift};
use crate::database::repositories::RateRepository;
use crate::error::PayError;
use crate::services::day_type::{HolidayCalendar, HolidayLookup, classify_day};
use crate::services::holidays::HolidayRegistry;
use crate::services::pay_calculator::{PayBreakdown, calculate_tiered_pay};
use crate::services::time_math::{self, hhmm, round_hours, validate_date_range};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub date: NaiveDate,
    #[serde(default, with = "optional_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "optional_hhmm")]
    pub end_time: Option<NaiveTime>,
    /// Used when no start/end pair is given
    pub hours: Option<f64>,
}

impl QuoteInput {
    pub fn worked_hours(&self) -> Result<f64, PayError> {
        match (self.start_time, self.end_time, self.hours) {
            (Some(start), Some(end), _) => Ok(time_math::shift_hours(start, end)),
            (None, None, Some(hours)) => time_math::validate_hours(hours),
            _ => Err(PayError::InvalidDuration(
                "provide either startTime and endTime or hours".to_string(),
            )),
        }
    }
}

mod optional_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::hhmm::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| super::time_math::parse_hhmm(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPay {
    pub shift_id: Option<Uuid>,
    pub date: NaiveDate,
    pub day_type: DayType,
    pub holiday_name: Option<String>,
    pub pay: PayBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnpricedShift {
    pub shift_id: Uuid,
    pub date: NaiveDate,
    pub day_type: DayType,
    pub hours: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillingReport {
    pub company_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub currency: String,
    pub total_amount: i64,
    pub total_hours: f64,
    pub shifts: Vec<ShiftPay>,
    /// Shifts whose day type has no tiers configured
    pub unpriced: Vec<UnpricedShift>,
}

/// Prices one shift given its tiers and the holidays around it.
pub fn price_with_tiers(
    shift_id: Option<Uuid>,
    date: NaiveDate,
    hours: f64,
    tiers: &[RateTier],
    holidays: &impl HolidayLookup,
    default_currency: &str,
) -> Result<ShiftPay, PayError> {
    let day_type = classify_day(date, holidays);
    let currency = tiers
        .first()
        .map(|tier| tier.currency.as_str())
        .unwrap_or(default_currency);

    let pay = calculate_tiered_pay(hours, tiers, currency).map_err(|err| match err {
        PayError::ConfigurationMissing(_) => PayError::ConfigurationMissing(format!(
            "no {} rate tiers configured for {}",
            day_type, date
        )),
        other => other,
    })?;

    Ok(ShiftPay {
        shift_id,
        date,
        day_type,
        holiday_name: holidays.describe(date).map(str::to_string),
        pay,
    })
}

/// Sums priced shifts into a report. Shifts without tiers are listed
/// separately instead of failing the whole range. Every priced shift must
/// share one currency.
pub fn assemble_report(
    company_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    default_currency: &str,
    results: Vec<(Shift, DayType, Result<ShiftPay, PayError>)>,
) -> Result<BillingReport, PayError> {
    let mut shifts = Vec::new();
    let mut unpriced = Vec::new();
    let mut total_hours = 0.0;

    for (shift, day_type, result) in results {
        let hours = shift.hours();
        total_hours += hours;
        match result {
            Ok(priced) => shifts.push(priced),
            Err(PayError::ConfigurationMissing(reason)) => unpriced.push(UnpricedShift {
                shift_id: shift.id,
                date: shift.shift_date,
                day_type,
                hours: round_hours(hours),
                reason,
            }),
            Err(other) => return Err(other),
        }
    }

    let currency = shifts
        .first()
        .map(|priced| priced.pay.currency.clone())
        .unwrap_or_else(|| default_currency.to_string());
    if let Some(other) = shifts.iter().find(|priced| priced.pay.currency != currency) {
        return Err(PayError::MixedCurrency(format!(
            "{} and {} tiers cannot be billed in one report",
            currency, other.pay.currency
        )));
    }

    Ok(BillingReport {
        company_id,
        start_date,
        end_date,
        currency,
        total_amount: shifts.iter().map(|priced| priced.pay.total_amount).sum(),
        total_hours: round_hours(total_hours),
        shifts,
        unpriced,
    })
}

#[derive(Clone)]
pub struct BillingService {
    rates: RateRepository,
    holidays: HolidayRegistry,
    default_currency: String,
}

impl BillingService {
    pub fn new(rates: RateRepository, holidays: HolidayRegistry, default_currency: String) -> Self {
        Self {
            rates,
            holidays,
            default_currency,
        }
    }

    pub async fn quote(&self, company_id: Uuid, input: &QuoteInput) -> Result<ShiftPay> {
        let hours = input.worked_hours()?;
        let calendar = self.holidays.calendar_for(input.date, input.date).await?;
        let day_type = classify_day(input.date, &calendar);
        let tiers = self.rates.get_rate_tiers(company_id, day_type, input.date).await?;

        let priced = price_with_tiers(
            None,
            input.date,
            hours,
            &tiers,
            &calendar,
            &self.default_currency,
        )?;
        Ok(priced)
    }

    pub async fn price_shift(&self, company_id: Uuid, shift: &Shift) -> Result<ShiftPay> {
        let calendar = self
            .holidays
            .calendar_for(shift.shift_date, shift.shift_date)
            .await?;
        let day_type = classify_day(shift.shift_date, &calendar);
        let tiers = self
            .rates
            .get_rate_tiers(company_id, day_type, shift.shift_date)
            .await?;

        let priced = price_with_tiers(
            Some(shift.id),
            shift.shift_date,
            shift.hours(),
            &tiers,
            &calendar,
            &self.default_currency,
        )?;
        Ok(priced)
    }

    pub async fn bill_range(
        &self,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        shifts: Vec<Shift>,
    ) -> Result<BillingReport> {
        validate_date_range(start, end)?;
        let calendar: HolidayCalendar = self.holidays.calendar_for(start, end).await?;

        let mut tier_cache: HashMap<(DayType, NaiveDate), Vec<RateTier>> = HashMap::new();
        let mut results = Vec::with_capacity(shifts.len());

        for shift in shifts.into_iter().filter(|shift| shift.status.is_payable()) {
            let day_type = classify_day(shift.shift_date, &calendar);
            let key = (day_type, shift.shift_date);
            if !tier_cache.contains_key(&key) {
                let tiers = self
                    .rates
                    .get_rate_tiers(company_id, day_type, shift.shift_date)
                    .await?;
                tier_cache.insert(key, tiers);
            }
            let tiers = tier_cache.get(&key).map(Vec::as_slice).unwrap_or_default();

            let result = price_with_tiers(
                Some(shift.id),
                shift.shift_date,
                shift.hours(),
                tiers,
                &calendar,
                &self.default_currency,
            );
            results.push((shift, day_type, result));
        }

        let report = assemble_report(company_id, start, end, &self.default_currency, results)?;
        if !report.unpriced.is_empty() {
            log::warn!(
                "{} shift(s) for company {} between {} and {} have no rate tiers",
                report.unpriced.len(),
                company_id,
                start,
                end
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::earnings::tests::shift;
    use crate::services::pay_calculator::tests::tier;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn missing_tiers_name_the_day_type() {
        let err = price_with_tiers(
            None,
            date(2026, 10, 18),
            6.0,
            &[],
            &HolidayCalendar::new(),
            "USD",
        )
        .unwrap_err();
        assert_eq!(
            err,
            PayError::ConfigurationMissing(
                "no sunday rate tiers configured for 2026-10-18".to_string()
            )
        );
    }

    #[test]
    fn holiday_name_is_attached() {
        let mut holidays = HolidayCalendar::new();
        holidays.insert(date(2026, 12, 25), "Christmas Day");
        let priced = price_with_tiers(
            None,
            date(2026, 12, 25),
            2.0,
            &[tier(1, None, 5000)],
            &holidays,
            "USD",
        )
        .unwrap();
        assert_eq!(priced.day_type, DayType::Holiday);
        assert_eq!(priced.holiday_name.as_deref(), Some("Christmas Day"));
        assert_eq!(priced.pay.total_amount, 10000);
    }

    #[test]
    fn report_separates_unpriced_shifts() {
        let weekday = shift(date(2026, 10, 14), time(9, 0), time(19, 0));
        let sunday = shift(date(2026, 10, 18), time(9, 0), time(12, 0));
        let tiers = vec![tier(1, Some(8.0), 2500), tier(2, None, 3750)];
        let calendar = HolidayCalendar::new();

        let results = vec![
            (
                weekday.clone(),
                DayType::Weekday,
                price_with_tiers(Some(weekday.id), weekday.shift_date, weekday.hours(), &tiers, &calendar, "USD"),
            ),
            (
                sunday.clone(),
                DayType::Sunday,
                price_with_tiers(Some(sunday.id), sunday.shift_date, sunday.hours(), &[], &calendar, "USD"),
            ),
        ];

        let report = assemble_report(
            Uuid::nil(),
            date(2026, 10, 12),
            date(2026, 10, 18),
            "USD",
            results,
        )
        .unwrap();

        assert_eq!(report.total_amount, 27500);
        assert_eq!(report.total_hours, 13.0);
        assert_eq!(report.shifts.len(), 1);
        assert_eq!(report.unpriced.len(), 1);
        assert_eq!(report.unpriced[0].day_type, DayType::Sunday);
    }

    #[test]
    fn report_refuses_mixed_currencies() {
        let weekday = shift(date(2026, 10, 14), time(9, 0), time(17, 0));
        let holiday = shift(date(2026, 12, 25), time(9, 0), time(12, 0));
        let mut holidays = HolidayCalendar::new();
        holidays.insert(date(2026, 12, 25), "Christmas Day");
        let mut euro = tier(1, None, 5000);
        euro.currency = "EUR".to_string();

        let results = vec![
            (
                weekday.clone(),
                DayType::Weekday,
                price_with_tiers(Some(weekday.id), weekday.shift_date, weekday.hours(), &[tier(1, None, 2500)], &holidays, "USD"),
            ),
            (
                holiday.clone(),
                DayType::Holiday,
                price_with_tiers(Some(holiday.id), holiday.shift_date, holiday.hours(), &[euro], &holidays, "USD"),
            ),
        ];

        let err = assemble_report(
            Uuid::nil(),
            date(2026, 10, 1),
            date(2026, 12, 31),
            "USD",
            results,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PayError::MixedCurrency("USD and EUR tiers cannot be billed in one report".to_string())
        );
    }

    #[test]
    fn quote_needs_times_or_hours() {
        let input = QuoteInput {
            date: date(2026, 10, 14),
            start_time: Some(time(22, 0)),
            end_time: Some(time(2, 0)),
            hours: None,
        };
        assert_eq!(input.worked_hours(), Ok(4.0));

        let input = QuoteInput {
            date: date(2026, 10, 14),
            start_time: None,
            end_time: None,
            hours: Some(7.5),
        };
        assert_eq!(input.worked_hours(), Ok(7.5));

        let input = QuoteInput {
            date: date(2026, 10, 14),
            start_time: Some(time(9, 0)),
            end_time: None,
            hours: None,
        };
        assert!(input.worked_hours().is_err());
    }

    #[test]
    fn quote_input_parses_hhmm() {
        let input: QuoteInput = serde_json::from_str(
            r#"{"date":"2026-10-14","startTime":"22:00","endTime":"02:00"}"#,
        )
        .unwrap();
        assert_eq!(input.start_time, Some(time(22, 0)));
        assert_eq!(input.hours, None);
    }
}
