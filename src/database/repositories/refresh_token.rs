use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{models::RefreshTokenRecord, transaction::DatabaseTransaction, utils::sql};

/// Fields of a refresh credential about to be stored.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, token: &NewRefreshToken) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert(&mut tx, token).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        token: &NewRefreshToken,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&sql(r#"
            INSERT INTO
                refresh_tokens (
                    id,
                    user_id,
                    company_id,
                    token_hash,
                    expires_at
                )
            VALUES
                (?, ?, ?, ?, ?)
        "#))
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.company_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&sql(r#"
            SELECT
                id,
                user_id,
                company_id,
                token_hash,
                expires_at,
                revoked_at,
                replaced_by,
                created_at
            FROM
                refresh_tokens
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Revokes `old_id` and stores its replacement atomically. Returns
    /// `false` without storing anything when `old_id` was already revoked,
    /// which happens when two refreshes race on the same credential.
    pub async fn rotate(&self, old_id: Uuid, replacement: NewRefreshToken) -> Result<bool> {
        let rotated = DatabaseTransaction::run(&self.pool, |tx| {
            Box::pin(async move {
                let revoked = sqlx::query(&sql(r#"
                    UPDATE refresh_tokens
                    SET
                        revoked_at = NOW(),
                        replaced_by = ?
                    WHERE
                        id = ?
                        AND revoked_at IS NULL
                "#))
                .bind(replacement.id)
                .bind(old_id)
                .execute(&mut **tx)
                .await?;

                if revoked.rows_affected() == 0 {
                    return Ok(false);
                }

                Self::insert(tx, &replacement).await?;
                Ok(true)
            })
        })
        .await?;

        Ok(rotated)
    }

    pub async fn revoke(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql(r#"
            UPDATE refresh_tokens
            SET
                revoked_at = NOW()
            WHERE
                id = ?
                AND revoked_at IS NULL
        "#))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(&sql(r#"
            UPDATE refresh_tokens
            SET
                revoked_at = NOW()
            WHERE
                user_id = ?
                AND revoked_at IS NULL
        "#))
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(&sql("DELETE FROM refresh_tokens WHERE expires_at < ?"))
            .bind(before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
