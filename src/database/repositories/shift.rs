use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{NewShift, RosterEntry, Shift, ShiftStatus},
    utils::sql,
};
use crate::services::time_math::round_hours;

#[derive(Debug, sqlx::FromRow)]
struct RosterRow {
    #[sqlx(flatten)]
    shift: Shift,
    employee_name: String,
}

#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_shift(&self, shift: &NewShift) -> Result<Shift> {
        let shift = sqlx::query_as::<_, Shift>(&sql(r#"
            INSERT INTO
                shifts (
                    user_id,
                    company_id,
                    shift_date,
                    start_time,
                    end_time,
                    shift_type,
                    status,
                    roster_assigned,
                    created_by,
                    notes
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                user_id,
                company_id,
                shift_date,
                start_time,
                end_time,
                shift_type,
                status,
                roster_assigned,
                created_by,
                notes,
                created_at,
                updated_at
        "#))
        .bind(shift.user_id)
        .bind(shift.company_id)
        .bind(shift.shift_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.shift_type)
        .bind(shift.status)
        .bind(shift.roster_assigned)
        .bind(shift.created_by)
        .bind(&shift.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                shift_date,
                start_time,
                end_time,
                shift_type,
                status,
                roster_assigned,
                created_by,
                notes,
                created_at,
                updated_at
            FROM
                shifts
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Rewrites the editable fields of a shift. Ownership columns are left
    /// untouched.
    pub async fn update_shift(&self, id: Uuid, shift: &NewShift) -> Result<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&sql(r#"
            UPDATE shifts
            SET
                shift_date = ?,
                start_time = ?,
                end_time = ?,
                shift_type = ?,
                status = ?,
                notes = ?,
                updated_at = NOW()
            WHERE
                id = ?
            RETURNING
                id,
                user_id,
                company_id,
                shift_date,
                start_time,
                end_time,
                shift_type,
                status,
                roster_assigned,
                created_by,
                notes,
                created_at,
                updated_at
        "#))
        .bind(shift.shift_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.shift_type)
        .bind(shift.status)
        .bind(&shift.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn update_status(&self, id: Uuid, status: ShiftStatus) -> Result<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&sql(r#"
            UPDATE shifts
            SET
                status = ?,
                updated_at = NOW()
            WHERE
                id = ?
            RETURNING
                id,
                user_id,
                company_id,
                shift_date,
                start_time,
                end_time,
                shift_type,
                status,
                roster_assigned,
                created_by,
                notes,
                created_at,
                updated_at
        "#))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn delete_shift(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM shifts WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Shifts of one user, optionally limited to a company and an inclusive
    /// date range. Open bounds are ignored.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                shift_date,
                start_time,
                end_time,
                shift_type,
                status,
                roster_assigned,
                created_by,
                notes,
                created_at,
                updated_at
            FROM
                shifts
            WHERE
                user_id = ?
                AND (?::uuid IS NULL OR company_id = ?)
                AND (?::date IS NULL OR shift_date >= ?)
                AND (?::date IS NULL OR shift_date <= ?)
            ORDER BY
                shift_date ASC,
                start_time ASC
        "#))
        .bind(user_id)
        .bind(company_id)
        .bind(company_id)
        .bind(start)
        .bind(start)
        .bind(end)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    pub async fn find_for_company_in_range(
        &self,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterRow>(&sql(r#"
            SELECT
                s.id,
                s.user_id,
                s.company_id,
                s.shift_date,
                s.start_time,
                s.end_time,
                s.shift_type,
                s.status,
                s.roster_assigned,
                s.created_by,
                s.notes,
                s.created_at,
                s.updated_at,
                u.name AS employee_name
            FROM
                shifts s
                JOIN users u ON u.id = s.user_id
            WHERE
                s.company_id = ?
                AND s.shift_date BETWEEN ? AND ?
            ORDER BY
                s.shift_date ASC,
                s.start_time ASC,
                u.name ASC
        "#))
        .bind(company_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RosterEntry {
                hours: round_hours(row.shift.hours()),
                shift: row.shift,
                employee_name: row.employee_name,
            })
            .collect())
    }
}
