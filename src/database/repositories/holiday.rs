use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::database::{
    models::{CreateHolidayInput, PublicHoliday},
    utils::sql,
};

#[derive(Clone)]
pub struct HolidayRepository {
    pool: PgPool,
}

impl HolidayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<PublicHoliday>> {
        let holidays = sqlx::query_as::<_, PublicHoliday>(&sql(r#"
            SELECT
                id,
                holiday_date,
                description,
                created_at
            FROM
                public_holidays
            WHERE
                holiday_date BETWEEN ? AND ?
            ORDER BY
                holiday_date ASC
        "#))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(holidays)
    }

    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Option<PublicHoliday>> {
        let holiday = sqlx::query_as::<_, PublicHoliday>(&sql(r#"
            SELECT
                id,
                holiday_date,
                description,
                created_at
            FROM
                public_holidays
            WHERE
                holiday_date = ?
        "#))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(holiday)
    }

    pub async fn create(&self, input: &CreateHolidayInput) -> Result<PublicHoliday> {
        let holiday = sqlx::query_as::<_, PublicHoliday>(&sql(r#"
            INSERT INTO
                public_holidays (
                    holiday_date,
                    description
                )
            VALUES
                (?, ?)
            RETURNING
                id,
                holiday_date,
                description,
                created_at
        "#))
        .bind(input.date)
        .bind(input.description.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(holiday)
    }
}
