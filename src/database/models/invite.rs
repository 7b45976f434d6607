use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::company::CompanyRole;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteToken {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub inviter_id: Uuid,
    pub role: CompanyRole,
    pub company_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteToken {
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteInput {
    pub email: String,
    pub role: Option<CompanyRole>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub invite_id: Uuid,
    pub invite_link: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteDetails {
    pub email: String,
    pub role: CompanyRole,
    pub company_id: Uuid,
    pub company_name: String,
    pub inviter_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInviteInput {
    pub token: String,
    /// Required when the invited email has no account yet
    pub name: Option<String>,
    pub password: String,
}
