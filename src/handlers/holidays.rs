use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use chrono::{Datelike, NaiveDate, Utc};

use crate::database::models::{CreateHolidayInput, HolidayYearQuery};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{HolidayRegistry, UserContext};

pub async fn get_holidays(
    query: Query<HolidayYearQuery>,
    _ctx: UserContext,
    registry: Data<HolidayRegistry>,
) -> Result<HttpResponse, AppError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let holidays = registry.list_year(year).await.map_err(|e| {
        log::error!("Failed to list public holidays for {}: {}", year, e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::ok(holidays))
}

pub async fn get_holiday(
    path: Path<NaiveDate>,
    _ctx: UserContext,
    registry: Data<HolidayRegistry>,
) -> Result<HttpResponse, AppError> {
    let date = path.into_inner();

    let holiday = registry
        .find(date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} is not a public holiday", date)))?;

    Ok(ApiResponse::ok(holiday))
}

/// Holidays are global and append-only
pub async fn create_holiday(
    input: Json<CreateHolidayInput>,
    ctx: UserContext,
    registry: Data<HolidayRegistry>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_admin()?;

    if input.description.trim().is_empty() {
        return Err(AppError::BadRequest("Description is required".to_string()));
    }
    if registry.find(input.date).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "{} is already a public holiday",
            input.date
        )));
    }

    let holiday = registry.add(&input).await?;

    Ok(ApiResponse::created(holiday))
}
