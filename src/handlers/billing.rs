use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::repositories::ShiftRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{
    BillingService, UserContext, billing::QuoteInput, time_math::validate_date_range,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Prices an ad-hoc duration on a date without storing anything
pub async fn quote(
    input: Json<QuoteInput>,
    ctx: UserContext,
    billing: Data<BillingService>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;

    let priced = billing.quote(company_id, &input).await?;

    Ok(ApiResponse::ok(priced))
}

pub async fn price_shift(
    path: Path<Uuid>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
    billing: Data<BillingService>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;
    let shift_id = path.into_inner();

    let shift = shifts
        .find_by_id(shift_id)
        .await?
        .filter(|shift| shift.company_id == Some(company_id))
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;
    ctx.requires_same_user_or_manager(shift.user_id)?;

    let priced = billing.price_shift(company_id, &shift).await?;

    Ok(ApiResponse::ok(priced))
}

pub async fn bill_range(
    query: Query<BillingRangeQuery>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
    billing: Data<BillingService>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;
    validate_date_range(query.start_date, query.end_date)?;

    let entries = shifts
        .find_for_company_in_range(company_id, query.start_date, query.end_date)
        .await
        .map_err(|e| {
            log::error!("Failed to load shifts for billing: {}", e);
            AppError::from(e)
        })?;
    let company_shifts = entries.into_iter().map(|entry| entry.shift).collect();

    let report = billing
        .bill_range(company_id, query.start_date, query.end_date, company_shifts)
        .await?;

    log::info!(
        "Billed {} shift(s) for company {}: {} {}",
        report.shifts.len(),
        company_id,
        report.total_amount,
        report.currency
    );

    Ok(ApiResponse::ok(report))
}
