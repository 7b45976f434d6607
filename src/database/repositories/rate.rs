use anyhow::Result;
use chrono::{Days, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{DayType, EmployeeRate, EmployeeRateInput, RateTier, RateTierInput},
    transaction::DatabaseTransaction,
    utils::sql,
};

#[derive(Clone)]
pub struct RateRepository {
    pool: PgPool,
}

impl RateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tiers of one (company, day type) group valid on `on_date`, in tier
    /// order.
    pub async fn get_rate_tiers(
        &self,
        company_id: Uuid,
        day_type: DayType,
        on_date: NaiveDate,
    ) -> Result<Vec<RateTier>> {
        let tiers = sqlx::query_as::<_, RateTier>(&sql(r#"
            SELECT
                id,
                company_id,
                shift_category,
                tier_order,
                hours_in_tier,
                rate_per_hour,
                day_type,
                currency,
                valid_from,
                valid_to,
                created_at,
                updated_at
            FROM
                rate_tiers
            WHERE
                company_id = ?
                AND day_type = ?
                AND valid_from <= ?
                AND (valid_to IS NULL OR valid_to >= ?)
            ORDER BY
                tier_order ASC
        "#))
        .bind(company_id)
        .bind(day_type)
        .bind(on_date)
        .bind(on_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    pub async fn list_tiers(
        &self,
        company_id: Uuid,
        day_type: Option<DayType>,
        on_date: Option<NaiveDate>,
    ) -> Result<Vec<RateTier>> {
        let tiers = sqlx::query_as::<_, RateTier>(&sql(r#"
            SELECT
                id,
                company_id,
                shift_category,
                tier_order,
                hours_in_tier,
                rate_per_hour,
                day_type,
                currency,
                valid_from,
                valid_to,
                created_at,
                updated_at
            FROM
                rate_tiers
            WHERE
                company_id = ?
                AND (?::text IS NULL OR day_type = ?)
                AND (?::date IS NULL OR (valid_from <= ? AND (valid_to IS NULL OR valid_to >= ?)))
            ORDER BY
                day_type ASC,
                tier_order ASC
        "#))
        .bind(company_id)
        .bind(day_type.map(|d| d.as_str()))
        .bind(day_type.map(|d| d.as_str()))
        .bind(on_date)
        .bind(on_date)
        .bind(on_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// Stores a new tier group for (company, day type) in one transaction,
    /// so readers never see a partial group. The group active before
    /// `valid_from` is closed the day before, and groups starting on or
    /// after it are replaced.
    pub async fn replace_tier_group(
        &self,
        company_id: Uuid,
        day_type: DayType,
        currency: &str,
        valid_from: NaiveDate,
        valid_to: Option<NaiveDate>,
        tiers: &[RateTierInput],
    ) -> Result<Vec<RateTier>> {
        let currency = currency.to_string();
        let tiers = tiers.to_vec();
        let closes_on = valid_from
            .checked_sub_days(Days::new(1))
            .unwrap_or(valid_from);

        let stored = DatabaseTransaction::run(&self.pool, |tx| {
            Box::pin(async move {
                sqlx::query(&sql(r#"
                    DELETE FROM rate_tiers
                    WHERE
                        company_id = ?
                        AND day_type = ?
                        AND valid_from >= ?
                "#))
                .bind(company_id)
                .bind(day_type)
                .bind(valid_from)
                .execute(&mut **tx)
                .await?;

                sqlx::query(&sql(r#"
                    UPDATE rate_tiers
                    SET
                        valid_to = ?,
                        updated_at = NOW()
                    WHERE
                        company_id = ?
                        AND day_type = ?
                        AND (valid_to IS NULL OR valid_to >= ?)
                "#))
                .bind(closes_on)
                .bind(company_id)
                .bind(day_type)
                .bind(valid_from)
                .execute(&mut **tx)
                .await?;

                let mut stored = Vec::with_capacity(tiers.len());
                for tier in &tiers {
                    let row = sqlx::query_as::<_, RateTier>(&sql(r#"
                        INSERT INTO
                            rate_tiers (
                                company_id,
                                shift_category,
                                tier_order,
                                hours_in_tier,
                                rate_per_hour,
                                day_type,
                                currency,
                                valid_from,
                                valid_to
                            )
                        VALUES
                            (?, ?, ?, ?, ?, ?, ?, ?, ?)
                        RETURNING
                            id,
                            company_id,
                            shift_category,
                            tier_order,
                            hours_in_tier,
                            rate_per_hour,
                            day_type,
                            currency,
                            valid_from,
                            valid_to,
                            created_at,
                            updated_at
                    "#))
                    .bind(company_id)
                    .bind(tier.shift_category.unwrap_or_default())
                    .bind(tier.tier_order)
                    .bind(tier.hours_in_tier)
                    .bind(tier.rate_per_hour)
                    .bind(day_type)
                    .bind(&currency)
                    .bind(valid_from)
                    .bind(valid_to)
                    .fetch_one(&mut **tx)
                    .await?;
                    stored.push(row);
                }

                stored.sort_by_key(|tier: &RateTier| tier.tier_order);
                Ok(stored)
            })
        })
        .await?;

        Ok(stored)
    }

    /// The employee's flat-rate record covering `on_date`.
    pub async fn get_employee_rate(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        on_date: NaiveDate,
    ) -> Result<Option<EmployeeRate>> {
        let rate = sqlx::query_as::<_, EmployeeRate>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                weekday_rate,
                weeknight_rate,
                saturday_rate,
                sunday_rate,
                public_holiday_rate,
                currency,
                valid_from,
                valid_to,
                created_at,
                updated_at
            FROM
                employee_rates
            WHERE
                user_id = ?
                AND company_id = ?
                AND valid_from <= ?
                AND (valid_to IS NULL OR valid_to >= ?)
            ORDER BY
                valid_from DESC
            LIMIT 1
        "#))
        .bind(user_id)
        .bind(company_id)
        .bind(on_date)
        .bind(on_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    /// Every record whose window overlaps `[start, end]`, newest first.
    pub async fn get_employee_rates_in_range(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EmployeeRate>> {
        let rates = sqlx::query_as::<_, EmployeeRate>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                weekday_rate,
                weeknight_rate,
                saturday_rate,
                sunday_rate,
                public_holiday_rate,
                currency,
                valid_from,
                valid_to,
                created_at,
                updated_at
            FROM
                employee_rates
            WHERE
                user_id = ?
                AND company_id = ?
                AND valid_from <= ?
                AND (valid_to IS NULL OR valid_to >= ?)
            ORDER BY
                valid_from DESC
        "#))
        .bind(user_id)
        .bind(company_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    /// Stores a new rate window. The window active before `valid_from` is
    /// closed the day before, and windows starting on or after it are
    /// superseded, so one record is active per date.
    pub async fn set_employee_rate(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        currency: &str,
        input: &EmployeeRateInput,
    ) -> Result<EmployeeRate> {
        let currency = currency.to_string();
        let input = input.clone();
        let closes_on = input
            .valid_from
            .checked_sub_days(Days::new(1))
            .unwrap_or(input.valid_from);

        let rate = DatabaseTransaction::run(&self.pool, |tx| {
            Box::pin(async move {
                sqlx::query(&sql(r#"
                    DELETE FROM employee_rates
                    WHERE
                        user_id = ?
                        AND company_id = ?
                        AND valid_from >= ?
                "#))
                .bind(user_id)
                .bind(company_id)
                .bind(input.valid_from)
                .execute(&mut **tx)
                .await?;

                sqlx::query(&sql(r#"
                    UPDATE employee_rates
                    SET
                        valid_to = ?,
                        updated_at = NOW()
                    WHERE
                        user_id = ?
                        AND company_id = ?
                        AND (valid_to IS NULL OR valid_to >= ?)
                "#))
                .bind(closes_on)
                .bind(user_id)
                .bind(company_id)
                .bind(input.valid_from)
                .execute(&mut **tx)
                .await?;

                let rate = sqlx::query_as::<_, EmployeeRate>(&sql(r#"
                    INSERT INTO
                        employee_rates (
                            user_id,
                            company_id,
                            weekday_rate,
                            weeknight_rate,
                            saturday_rate,
                            sunday_rate,
                            public_holiday_rate,
                            currency,
                            valid_from,
                            valid_to
                        )
                    VALUES
                        (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    RETURNING
                        id,
                        user_id,
                        company_id,
                        weekday_rate,
                        weeknight_rate,
                        saturday_rate,
                        sunday_rate,
                        public_holiday_rate,
                        currency,
                        valid_from,
                        valid_to,
                        created_at,
                        updated_at
                "#))
                .bind(user_id)
                .bind(company_id)
                .bind(input.weekday_rate)
                .bind(input.weeknight_rate)
                .bind(input.saturday_rate)
                .bind(input.sunday_rate)
                .bind(input.public_holiday_rate)
                .bind(&currency)
                .bind(input.valid_from)
                .bind(input.valid_to)
                .fetch_one(&mut **tx)
                .await?;

                Ok(rate)
            })
        })
        .await?;

        Ok(rate)
    }

    pub async fn list_employee_rates(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Vec<EmployeeRate>> {
        let rates = sqlx::query_as::<_, EmployeeRate>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                weekday_rate,
                weeknight_rate,
                saturday_rate,
                sunday_rate,
                public_holiday_rate,
                currency,
                valid_from,
                valid_to,
                created_at,
                updated_at
            FROM
                employee_rates
            WHERE
                user_id = ?
                AND company_id = ?
            ORDER BY
                valid_from DESC
        "#))
        .bind(user_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }
}
