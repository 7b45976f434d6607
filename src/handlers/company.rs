use actix_web::{
    HttpResponse,
    web::{Data, Json, Path},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{
        AddEmployeeToCompanyInput, CompanyInfo, CompanyRole, CreateCompanyInput,
        UpdateEmployeeRoleInput,
    },
    repositories::{CompanyRepository, UserRepository},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::UserContext;

pub async fn get_user_companies(
    ctx: UserContext,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = ctx.user_id();
    let companies = companies.get_companies_for_user(user_id).await.map_err(|e| {
        log::error!("Failed to get companies for user {}: {}", user_id, e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::ok(companies))
}

/// Creates a company with the caller as its admin, in one transaction.
pub async fn create_company(
    request: Json<CreateCompanyInput>,
    ctx: UserContext,
    pool: Data<PgPool>,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Company name is required".to_string()));
    }

    let user_id = ctx.user_id();
    let is_first = companies.get_companies_for_user(user_id).await?.is_empty();
    let request = request.into_inner();

    let company = DatabaseTransaction::run(&pool, |tx| {
        Box::pin(async move {
            let company = CompanyRepository::insert_company(tx, &request).await?;
            CompanyRepository::insert_member(
                tx,
                company.id,
                user_id,
                CompanyRole::Admin,
                is_first,
                None,
            )
            .await?;

            Ok(company)
        })
    })
    .await?;

    log::info!("User {} created company {}", user_id, company.id);

    Ok(ApiResponse::created(CompanyInfo {
        id: company.id,
        name: company.name,
        email: company.email,
        phone: company.phone,
        timezone: company.timezone,
        role: CompanyRole::Admin,
        is_primary: is_first,
        hire_date: None,
    }))
}

pub async fn get_company_employees(
    ctx: UserContext,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;

    let employees = companies
        .get_company_employees(company_id)
        .await
        .map_err(|e| {
            log::error!("Failed to get employees for company {}: {}", company_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(employees))
}

pub async fn add_employee_to_company(
    input: Json<AddEmployeeToCompanyInput>,
    ctx: UserContext,
    companies: Data<CompanyRepository>,
    users: Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;

    // Only admins hand out elevated roles
    if input.role.is_some_and(|role| role != CompanyRole::Employee) {
        ctx.requires_admin()?;
    }

    if users.find_by_id(input.user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    companies.add_employee(company_id, &input).await?;
    log::info!(
        "User {} added {} to company {}",
        ctx.user_id(),
        input.user_id,
        company_id
    );

    Ok(ApiResponse::<()>::message("Employee added to company"))
}

pub async fn update_employee_role(
    path: Path<Uuid>,
    input: Json<UpdateEmployeeRoleInput>,
    ctx: UserContext,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_admin()?;
    let company_id = ctx.strict_company_id()?;
    let user_id = path.into_inner();

    if user_id == ctx.user_id() {
        return Err(AppError::BadRequest(
            "You cannot change your own role".to_string(),
        ));
    }

    companies
        .update_employee_role(company_id, user_id, input.role)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found in this company".to_string()))?;

    Ok(ApiResponse::<()>::message("Employee role updated"))
}

pub async fn remove_employee_from_company(
    path: Path<Uuid>,
    ctx: UserContext,
    companies: Data<CompanyRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_admin()?;
    let company_id = ctx.strict_company_id()?;
    let user_id = path.into_inner();

    if user_id == ctx.user_id() {
        return Err(AppError::BadRequest(
            "You cannot remove yourself from the company".to_string(),
        ));
    }

    companies
        .remove_employee(company_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found in this company".to_string()))?;

    Ok(ApiResponse::<()>::message("Employee removed from company"))
}
