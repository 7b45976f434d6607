use anyhow::Result;
use chrono::{DateTime, Utc};
use futures_util::TryFutureExt;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{CompanyRole, InviteDetails, InviteToken},
    utils::sql,
};

#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_invite(
        &self,
        email: &str,
        token: &str,
        inviter_id: Uuid,
        role: CompanyRole,
        company_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteToken> {
        let invite = sqlx::query_as::<_, InviteToken>(&sql(r#"
            INSERT INTO
                invite_tokens (
                    email,
                    token,
                    inviter_id,
                    role,
                    company_id,
                    expires_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                email,
                token,
                inviter_id,
                role,
                company_id,
                expires_at,
                used_at,
                created_at
        "#))
        .bind(email.trim().to_lowercase())
        .bind(token)
        .bind(inviter_id)
        .bind(role)
        .bind(company_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .map_err(|e| {
            log::error!("Failed to create invite token: {}", e);
            e
        })
        .await?;

        Ok(invite)
    }

    /// Unused invite by token, expired or not.
    pub async fn find_unused(&self, token: &str) -> Result<Option<InviteToken>> {
        let invite = sqlx::query_as::<_, InviteToken>(&sql(r#"
            SELECT
                id,
                email,
                token,
                inviter_id,
                role,
                company_id,
                expires_at,
                used_at,
                created_at
            FROM
                invite_tokens
            WHERE
                token = ?
                AND used_at IS NULL
        "#))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    pub async fn find_pending_details(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InviteDetails>> {
        let details = sqlx::query_as::<_, InviteDetails>(&sql(r#"
            SELECT
                i.email,
                i.role,
                i.company_id,
                c.name AS company_name,
                u.name AS inviter_name,
                i.expires_at
            FROM
                invite_tokens i
                JOIN companies c ON c.id = i.company_id
                JOIN users u ON u.id = i.inviter_id
            WHERE
                i.token = ?
                AND i.used_at IS NULL
                AND i.expires_at > ?
        "#))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(details)
    }

    /// Returns `false` when the invite was consumed concurrently.
    pub async fn mark_used(
        tx: &mut Transaction<'_, Postgres>,
        invite_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&sql(
            "UPDATE invite_tokens SET used_at = NOW() WHERE id = ? AND used_at IS NULL",
        ))
        .bind(invite_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<InviteToken>> {
        let invites = sqlx::query_as::<_, InviteToken>(&sql(r#"
            SELECT
                id,
                email,
                token,
                inviter_id,
                role,
                company_id,
                expires_at,
                used_at,
                created_at
            FROM
                invite_tokens
            WHERE
                company_id = ?
            ORDER BY
                created_at DESC
        "#))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }
}
