use actix_web::{
    HttpResponse,
    web::{Data, Json, Path},
};
use bcrypt::verify;
use chrono::{Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use sqlx::PgPool;

use crate::config::Config;
use crate::database::{
    models::{
        AcceptInviteInput, AuthResponse, CompanyRole, CreateInviteInput, CreateInviteResponse,
        CreateUserInput, User,
    },
    repositories::{CompanyRepository, InviteRepository, UserRepository},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AuthService, UserContext, auth::validate_registration};

const INVITE_TOKEN_LENGTH: usize = 48;

fn generate_invite_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub async fn create_invite(
    input: Json<CreateInviteInput>,
    ctx: UserContext,
    config: Data<Config>,
    invites: Data<InviteRepository>,
    users: Data<UserRepository>,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;

    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }

    let role = input.role.unwrap_or(CompanyRole::Employee);
    if role != CompanyRole::Employee {
        ctx.requires_admin()?;
    }

    if let Some(existing) = users.find_by_email(&email).await? {
        if companies.member_role(existing.id, company_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User is already a member of this company".to_string(),
            ));
        }
    }

    let token = generate_invite_token();
    let expires_at = Utc::now() + Duration::days(config.invite_ttl_days);

    let invite = invites
        .create_invite(&email, &token, ctx.user_id(), role, company_id, expires_at)
        .await?;

    // No mail transport; the link is handed back to the inviter
    let invite_link = format!("{}/invite/{}", config.client_base_url, token);
    log::info!(
        "Invite {} for {} to company {}: {}",
        invite.id,
        email,
        company_id,
        invite_link
    );

    Ok(ApiResponse::created(CreateInviteResponse {
        invite_id: invite.id,
        invite_link,
        expires_at: invite.expires_at,
    }))
}

pub async fn get_invites(
    ctx: UserContext,
    invites: Data<InviteRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;

    let invites = invites.list_for_company(company_id).await.map_err(|e| {
        log::error!("Failed to list invites for company {}: {}", company_id, e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::ok(invites))
}

pub async fn get_invite(
    path: Path<String>,
    invites: Data<InviteRepository>,
) -> Result<HttpResponse, AppError> {
    let details = invites
        .find_pending_details(&path, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found or expired".to_string()))?;

    Ok(ApiResponse::ok(details))
}

/// Accepts an invite for a new or existing account. Creating the account,
/// the membership and consuming the invite happen in one transaction.
pub async fn accept_invite(
    input: Json<AcceptInviteInput>,
    pool: Data<PgPool>,
    invites: Data<InviteRepository>,
    users: Data<UserRepository>,
    companies: Data<CompanyRepository>,
    auth: Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    let invite = invites
        .find_unused(&input.token)
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

    if !invite.is_pending_at(Utc::now()) {
        return Err(AppError::BadRequest("Invite has expired".to_string()));
    }

    let (user, is_new, is_primary) = match users.find_by_email(&invite.email).await? {
        Some(user) => {
            if !verify(&input.password, &user.password_hash)? {
                return Err(AppError::unauthorized("Invalid email or password"));
            }
            if companies
                .member_role(user.id, invite.company_id)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "You are already a member of this company".to_string(),
                ));
            }
            let is_primary = companies.get_companies_for_user(user.id).await?.is_empty();
            (user, false, is_primary)
        }
        None => {
            let registration = CreateUserInput {
                email: invite.email.clone(),
                password: input.password.clone(),
                name: input.name.clone().unwrap_or_default(),
            };
            validate_registration(&registration)?;

            let password_hash = AuthService::hash_password(&registration.password)?;
            let user = User::new(
                registration.email,
                password_hash,
                registration.name.trim().to_string(),
            );
            (user, true, true)
        }
    };

    let invite_id = invite.id;
    let company_id = invite.company_id;
    let role = invite.role;
    let user_id = user.id;
    let new_user = is_new.then(|| user.clone());

    DatabaseTransaction::run(&pool, |tx| {
        Box::pin(async move {
            if let Some(new_user) = &new_user {
                UserRepository::insert_user(tx, new_user).await?;
            }
            CompanyRepository::insert_member(tx, company_id, user_id, role, is_primary, None)
                .await?;
            if !InviteRepository::mark_used(tx, invite_id).await? {
                return Err(AppError::Conflict("Invite has already been used".to_string()));
            }

            Ok(())
        })
    })
    .await?;

    log::info!(
        "User {} joined company {} as {} via invite {}",
        user.id,
        company_id,
        role,
        invite_id
    );

    let company = companies.find_company_info(user.id, company_id).await?;
    let tokens = auth.issue_pair(&user, company.as_ref()).await?;

    Ok(ApiResponse::ok(AuthResponse {
        tokens,
        user: user.into(),
        company,
    }))
}
