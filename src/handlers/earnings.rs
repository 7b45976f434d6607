use actix_web::{
    HttpResponse,
    web::{Data, Query},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::repositories::{RateRepository, ShiftRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{
    HolidayRegistry, UserContext, earnings::aggregate_earnings, time_math::validate_date_range,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Managers may look at another employee
    pub user_id: Option<Uuid>,
}

pub async fn get_earnings(
    query: Query<EarningsQuery>,
    ctx: UserContext,
    config: Data<Config>,
    shifts: Data<ShiftRepository>,
    rates: Data<RateRepository>,
    registry: Data<HolidayRegistry>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;
    validate_date_range(query.start_date, query.end_date)?;

    let user_id = query.user_id.unwrap_or_else(|| ctx.user_id());
    ctx.requires_same_user_or_manager(user_id)?;

    let worked = shifts
        .find_for_user(
            user_id,
            Some(company_id),
            Some(query.start_date),
            Some(query.end_date),
        )
        .await?;
    let employee_rates = rates
        .get_employee_rates_in_range(user_id, company_id, query.start_date, query.end_date)
        .await?;
    let calendar = registry
        .calendar_for(query.start_date, query.end_date)
        .await?;

    let summary = aggregate_earnings(
        &worked,
        &employee_rates,
        &calendar,
        config.night_shift_cutoff,
        &config.default_currency,
    );

    if !summary.rates_configured && !worked.is_empty() {
        log::warn!(
            "User {} has {} shift(s) but no rates in company {}",
            user_id,
            worked.len(),
            company_id
        );
    }

    Ok(ApiResponse::ok(summary))
}
