use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{TimeOffRequest, TimeOffRequestInput, TimeOffStatus},
    utils::sql,
};

#[derive(Clone)]
pub struct TimeOffRepository {
    pool: PgPool,
}

impl TimeOffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_request(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        input: &TimeOffRequestInput,
    ) -> Result<TimeOffRequest> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(r#"
            INSERT INTO
                time_off_requests (
                    user_id,
                    company_id,
                    start_date,
                    end_date,
                    reason,
                    request_type,
                    status
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                user_id,
                company_id,
                start_date,
                end_date,
                reason,
                request_type,
                status,
                reviewed_by,
                review_notes,
                created_at,
                updated_at
        "#))
        .bind(user_id)
        .bind(company_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.reason)
        .bind(input.request_type)
        .bind(TimeOffStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeOffRequest>> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                start_date,
                end_date,
                reason,
                request_type,
                status,
                reviewed_by,
                review_notes,
                created_at,
                updated_at
            FROM
                time_off_requests
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn list_for_company(
        &self,
        company_id: Uuid,
        user_id: Option<Uuid>,
        status: Option<TimeOffStatus>,
    ) -> Result<Vec<TimeOffRequest>> {
        let requests = sqlx::query_as::<_, TimeOffRequest>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                start_date,
                end_date,
                reason,
                request_type,
                status,
                reviewed_by,
                review_notes,
                created_at,
                updated_at
            FROM
                time_off_requests
            WHERE
                company_id = ?
                AND (?::uuid IS NULL OR user_id = ?)
                AND (?::text IS NULL OR status = ?)
            ORDER BY
                start_date DESC,
                created_at DESC
        "#))
        .bind(company_id)
        .bind(user_id)
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Moves a pending request to `status`. Returns `None` when the request
    /// is missing or no longer pending.
    pub async fn resolve_pending(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        reviewed_by: Option<Uuid>,
        review_notes: Option<&str>,
    ) -> Result<Option<TimeOffRequest>> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(r#"
            UPDATE time_off_requests
            SET
                status = ?,
                reviewed_by = ?,
                review_notes = ?,
                updated_at = NOW()
            WHERE
                id = ?
                AND status = 'pending'
            RETURNING
                id,
                user_id,
                company_id,
                start_date,
                end_date,
                reason,
                request_type,
                status,
                reviewed_by,
                review_notes,
                created_at,
                updated_at
        "#))
        .bind(status)
        .bind(reviewed_by)
        .bind(review_notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }
}
