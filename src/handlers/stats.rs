use actix_web::{
    HttpResponse,
    web::{Data, Query},
};

use crate::database::models::ShiftRangeQuery;
use crate::database::repositories::ShiftRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, stats::compute_shift_stats, time_math::validate_date_range};

/// Personal shift statistics, optionally limited to a date range
pub async fn get_my_stats(
    query: Query<ShiftRangeQuery>,
    ctx: UserContext,
    shifts: Data<ShiftRepository>,
) -> Result<HttpResponse, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        validate_date_range(start, end)?;
    }

    let user_id = ctx.user_id();
    let worked = shifts
        .find_for_user(user_id, ctx.company_id(), query.start_date, query.end_date)
        .await
        .map_err(|e| {
            log::error!("Failed to load shifts for stats of {}: {}", user_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(compute_shift_stats(&worked)))
}
