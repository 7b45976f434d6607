use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    /// Calendar classification of a date for pay purposes.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum DayType {
        Weekday => "weekday",
        Saturday => "saturday",
        Sunday => "sunday",
        Holiday => "holiday",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum ShiftCategory {
        #[default]
        Day => "day",
        Night => "night",
        Weekend => "weekend",
        Holiday => "holiday",
        Custom => "custom",
    }
}

string_enum! {
    /// Flat-rate bucket used by the earnings aggregator.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(rename_all = "snake_case")]
    pub enum RateCategory {
        Weekday => "weekday",
        Weeknight => "weeknight",
        Saturday => "saturday",
        Sunday => "sunday",
        PublicHoliday => "public_holiday",
    }
}

/// One bracket of a company's tiered pay schedule.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateTier {
    pub id: Uuid,
    pub company_id: Uuid,
    pub shift_category: ShiftCategory,
    pub tier_order: i32,
    /// `None` means the tier absorbs all remaining hours
    pub hours_in_tier: Option<f64>,
    /// Minor currency units per hour
    pub rate_per_hour: i64,
    pub day_type: DayType,
    pub currency: String,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateTierInput {
    pub tier_order: i32,
    pub hours_in_tier: Option<f64>,
    pub rate_per_hour: i64,
    pub shift_category: Option<ShiftCategory>,
}

/// Replaces the whole (company, day-type) tier group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTierGroupInput {
    pub currency: Option<String>,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub tiers: Vec<RateTierInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTierQuery {
    pub day_type: Option<DayType>,
    pub on_date: Option<NaiveDate>,
}

/// Flat hourly rates for one employee, in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub weekday_rate: i64,
    pub weeknight_rate: i64,
    pub saturday_rate: i64,
    pub sunday_rate: i64,
    pub public_holiday_rate: i64,
    pub currency: String,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeRate {
    pub fn rate_for(&self, category: RateCategory) -> i64 {
        match category {
            RateCategory::Weekday => self.weekday_rate,
            RateCategory::Weeknight => self.weeknight_rate,
            RateCategory::Saturday => self.saturday_rate,
            RateCategory::Sunday => self.sunday_rate,
            RateCategory::PublicHoliday => self.public_holiday_rate,
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRateInput {
    pub weekday_rate: i64,
    pub weeknight_rate: i64,
    pub saturday_rate: i64,
    pub sunday_rate: i64,
    pub public_holiday_rate: i64,
    pub currency: Option<String>,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
}

impl EmployeeRateInput {
    pub fn rates(&self) -> [i64; 5] {
        [
            self.weekday_rate,
            self.weeknight_rate,
            self.saturday_rate,
            self.sunday_rate,
            self.public_holiday_rate,
        ]
    }
}
