use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::database::models::{CreateHolidayInput, PublicHoliday};
use crate::database::repositories::HolidayRepository;
use crate::services::day_type::{HolidayCalendar, HolidayLookup};

/// Public holiday lookups backed by the database, cached per calendar year.
#[derive(Clone)]
pub struct HolidayRegistry {
    repository: HolidayRepository,
    cache: Cache<i32, Arc<HolidayCalendar>>,
}

impl HolidayRegistry {
    pub fn new(repository: HolidayRepository, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(32)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        Self { repository, cache }
    }

    pub async fn calendar_for_year(&self, year: i32) -> Result<Arc<HolidayCalendar>> {
        if let Some(calendar) = self.cache.get(&year).await {
            return Ok(calendar);
        }

        let (start, end) = year_bounds(year)?;
        let holidays = self.repository.list_in_range(start, end).await?;
        let calendar: Arc<HolidayCalendar> = Arc::new(holidays.into_iter().collect());
        log::debug!("Loaded {} public holidays for {}", calendar.len(), year);

        self.cache.insert(year, calendar.clone()).await;
        Ok(calendar)
    }

    /// Holidays for every year touched by `[start, end]`.
    pub async fn calendar_for(&self, start: NaiveDate, end: NaiveDate) -> Result<HolidayCalendar> {
        let mut calendar = HolidayCalendar::new();
        for year in start.year()..=end.year() {
            let yearly = self.calendar_for_year(year).await?;
            calendar.extend(
                yearly
                    .iter()
                    .filter(|(date, _)| **date >= start && **date <= end)
                    .map(|(date, description)| (*date, description.clone())),
            );
        }

        Ok(calendar)
    }

    pub async fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.calendar_for_year(date.year()).await?.is_holiday(date))
    }

    pub async fn describe(&self, date: NaiveDate) -> Result<Option<String>> {
        let calendar = self.calendar_for_year(date.year()).await?;
        Ok(calendar.describe(date).map(str::to_string))
    }

    pub async fn list_year(&self, year: i32) -> Result<Vec<PublicHoliday>> {
        let (start, end) = year_bounds(year)?;
        self.repository.list_in_range(start, end).await
    }

    pub async fn find(&self, date: NaiveDate) -> Result<Option<PublicHoliday>> {
        self.repository.find_by_date(date).await
    }

    pub async fn add(&self, input: &CreateHolidayInput) -> Result<PublicHoliday> {
        let holiday = self.repository.create(input).await?;
        self.cache.invalidate(&holiday.holiday_date.year()).await;
        log::info!(
            "Registered public holiday {} ({})",
            holiday.holiday_date,
            holiday.description
        );

        Ok(holiday)
    }

    #[cfg(test)]
    async fn prime(&self, year: i32, calendar: HolidayCalendar) {
        self.cache.insert(year, Arc::new(calendar)).await;
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start
        .zip(end)
        .ok_or_else(|| anyhow!("Year {} is out of range", year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlx::postgres::PgPoolOptions;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn registry() -> HolidayRegistry {
        // Never connects: every lookup below is served from the cache
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        HolidayRegistry::new(HolidayRepository::new(pool), 60)
    }

    #[actix_rt::test]
    async fn cached_year_answers_lookups() {
        let registry = registry();
        let mut calendar = HolidayCalendar::new();
        calendar.insert(date(2026, 1, 1), "New Year's Day");
        registry.prime(2026, calendar).await;

        assert!(registry.is_holiday(date(2026, 1, 1)).await.unwrap());
        assert!(!registry.is_holiday(date(2026, 1, 2)).await.unwrap());
        assert_eq!(
            registry.describe(date(2026, 1, 1)).await.unwrap().as_deref(),
            Some("New Year's Day")
        );
    }

    #[actix_rt::test]
    async fn range_calendar_spans_years_and_clips() {
        let registry = registry();
        let mut y2025 = HolidayCalendar::new();
        y2025.insert(date(2025, 12, 25), "Christmas Day");
        y2025.insert(date(2025, 1, 1), "New Year's Day");
        let mut y2026 = HolidayCalendar::new();
        y2026.insert(date(2026, 1, 1), "New Year's Day");
        registry.prime(2025, y2025).await;
        registry.prime(2026, y2026).await;

        let calendar = registry
            .calendar_for(date(2025, 12, 1), date(2026, 1, 31))
            .await
            .unwrap();
        assert_eq!(calendar.len(), 2);
    }

    #[test]
    fn year_bounds_cover_whole_year() {
        assert_eq!(
            year_bounds(2026).unwrap(),
            (date(2026, 1, 1), date(2026, 12, 31))
        );
    }
}
