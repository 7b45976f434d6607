use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;

use crate::database::models::{
    CompanyInfo, CreateUserInput, LoginInput, RefreshInput, SwitchCompanyInput, UserInfo,
};
use crate::database::repositories::CompanyRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{AuthService, UserContext};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserInfo,
    pub active_company: Option<CompanyInfo>,
    pub companies: Vec<CompanyInfo>,
}

pub async fn register(
    auth: web::Data<AuthService>,
    input: web::Json<CreateUserInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth.register(input.into_inner()).await?;

    Ok(ApiResponse::created(response))
}

pub async fn login(
    auth: web::Data<AuthService>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth.login(input.into_inner()).await?;

    Ok(ApiResponse::ok(response))
}

pub async fn refresh(
    auth: web::Data<AuthService>,
    input: web::Json<RefreshInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth.refresh(&input.refresh_token).await?;

    Ok(ApiResponse::ok(response))
}

pub async fn logout(
    auth: web::Data<AuthService>,
    input: web::Json<RefreshInput>,
) -> Result<HttpResponse, AppError> {
    auth.logout(&input.refresh_token).await?;

    Ok(ApiResponse::<()>::message("Logged out"))
}

pub async fn logout_all(
    ctx: UserContext,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let revoked = auth.logout_all(ctx.user_id()).await?;

    Ok(ApiResponse::ok(json!({ "revokedSessions": revoked })))
}

pub async fn switch_company(
    ctx: UserContext,
    auth: web::Data<AuthService>,
    input: web::Json<SwitchCompanyInput>,
) -> Result<HttpResponse, AppError> {
    let response = auth.switch_company(&ctx.user, input.company_id).await?;

    Ok(ApiResponse::ok(response))
}

pub async fn me(
    ctx: UserContext,
    companies: web::Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = ctx.user_id();
    let companies = companies.get_companies_for_user(user_id).await.map_err(|e| {
        log::error!("Failed to get companies for user {}: {}", user_id, e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::ok(MeResponse {
        user: ctx.user.into(),
        active_company: ctx.company,
        companies,
    }))
}
