use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use uuid::Uuid;

use crate::database::models::{
    ReviewInput, TimeOffQuery, TimeOffRequest, TimeOffRequestInput, TimeOffStatus,
};
use crate::database::repositories::TimeOffRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, time_math::validate_date_range};

/// Create a new time-off request for the caller in their active company
pub async fn create_time_off_request(
    input: Json<TimeOffRequestInput>,
    ctx: UserContext,
    repo: Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;
    validate_date_range(input.start_date, input.end_date)?;

    let user_id = ctx.user_id();
    let request = repo
        .create_request(user_id, company_id, &input)
        .await
        .map_err(|e| {
            log::error!("Error creating time-off request for {}: {}", user_id, e);
            AppError::from(e)
        })?;

    log::info!(
        "User {} requested {} day(s) of {} leave",
        user_id,
        request.days(),
        request.request_type
    );

    Ok(ApiResponse::created(request))
}

/// Employees see their own requests; managers may see the whole company
pub async fn get_time_off_requests(
    query: Query<TimeOffQuery>,
    ctx: UserContext,
    repo: Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;

    let user_filter = if ctx.is_manager_or_admin() {
        query.user_id
    } else {
        Some(ctx.user_id())
    };

    let requests = repo
        .list_for_company(company_id, user_filter, query.status)
        .await
        .map_err(|e| {
            log::error!("Error listing time-off requests: {}", e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(requests))
}

async fn load_request(
    repo: &TimeOffRepository,
    ctx: &UserContext,
    id: Uuid,
) -> Result<TimeOffRequest, AppError> {
    let request = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time-off request not found".to_string()))?;
    ctx.requires_same_company(Some(request.company_id))?;

    Ok(request)
}

async fn review(
    id: Uuid,
    status: TimeOffStatus,
    notes: Option<String>,
    ctx: UserContext,
    repo: &TimeOffRepository,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    load_request(repo, &ctx, id).await?;

    let request = repo
        .resolve_pending(id, status, Some(ctx.user_id()), notes.as_deref())
        .await?
        .ok_or_else(|| AppError::Conflict("Time-off request is no longer pending".to_string()))?;

    log::info!("Manager {} set time-off request {} to {}", ctx.user_id(), id, status);

    Ok(ApiResponse::ok(request))
}

pub async fn approve_time_off_request(
    path: Path<Uuid>,
    input: Option<Json<ReviewInput>>,
    ctx: UserContext,
    repo: Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let notes = input.and_then(|i| i.into_inner().notes);
    review(path.into_inner(), TimeOffStatus::Approved, notes, ctx, &repo).await
}

pub async fn deny_time_off_request(
    path: Path<Uuid>,
    input: Option<Json<ReviewInput>>,
    ctx: UserContext,
    repo: Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let notes = input.and_then(|i| i.into_inner().notes);
    review(path.into_inner(), TimeOffStatus::Denied, notes, ctx, &repo).await
}

/// Owners may withdraw a request while it is still pending
pub async fn cancel_time_off_request(
    path: Path<Uuid>,
    ctx: UserContext,
    repo: Data<TimeOffRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let request = load_request(&repo, &ctx, id).await?;

    if request.user_id != ctx.user_id() {
        return Err(AppError::Forbidden(
            "You can only cancel your own requests".to_string(),
        ));
    }

    let request = repo
        .resolve_pending(id, TimeOffStatus::Cancelled, None, None)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Only pending requests can be cancelled".to_string())
        })?;

    Ok(ApiResponse::ok(request))
}
