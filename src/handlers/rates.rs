use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    DayType, EmployeeRate, EmployeeRateInput, RateTierQuery, ReplaceTierGroupInput,
};
use crate::database::repositories::{CompanyRepository, RateRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{UserContext, pay_calculator::validate_tier_group};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRatesResponse {
    /// The window covering today, if any
    pub current: Option<EmployeeRate>,
    pub history: Vec<EmployeeRate>,
}

/// Uppercases a three-letter ISO 4217 code, falling back to the default.
pub(crate) fn normalize_currency(currency: Option<&str>, default: &str) -> Result<String, AppError> {
    let code = currency.unwrap_or(default).trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::BadRequest(format!(
            "Currency '{}' must be a three-letter code",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

pub async fn get_rate_tiers(
    query: Query<RateTierQuery>,
    ctx: UserContext,
    rates: Data<RateRepository>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;

    let tiers = rates
        .list_tiers(company_id, query.day_type, query.on_date)
        .await
        .map_err(|e| {
            log::error!("Failed to list rate tiers for company {}: {}", company_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(tiers))
}

pub async fn replace_rate_tiers(
    path: Path<DayType>,
    input: Json<ReplaceTierGroupInput>,
    ctx: UserContext,
    config: Data<Config>,
    rates: Data<RateRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;
    let day_type = path.into_inner();

    validate_tier_group(&input.tiers)?;
    if let Some(valid_to) = input.valid_to {
        if valid_to < input.valid_from {
            return Err(AppError::BadRequest(
                "validTo must not be before validFrom".to_string(),
            ));
        }
    }

    let currency = normalize_currency(input.currency.as_deref(), &config.default_currency)?;

    let tiers = rates
        .replace_tier_group(
            company_id,
            day_type,
            &currency,
            input.valid_from,
            input.valid_to,
            &input.tiers,
        )
        .await?;

    log::info!(
        "User {} replaced {} tier group of company {} ({} tiers)",
        ctx.user_id(),
        day_type,
        company_id,
        tiers.len()
    );

    Ok(ApiResponse::ok(tiers))
}

pub async fn get_employee_rates(
    path: Path<Uuid>,
    ctx: UserContext,
    rates: Data<RateRepository>,
) -> Result<HttpResponse, AppError> {
    let company_id = ctx.strict_company_id()?;
    let user_id = path.into_inner();
    ctx.requires_same_user_or_manager(user_id)?;

    let today = Utc::now().date_naive();
    let current = rates.get_employee_rate(user_id, company_id, today).await?;
    let history = rates
        .list_employee_rates(user_id, company_id)
        .await
        .map_err(|e| {
            log::error!("Failed to list rates for user {}: {}", user_id, e);
            AppError::from(e)
        })?;

    Ok(ApiResponse::ok(EmployeeRatesResponse { current, history }))
}

pub async fn set_employee_rate(
    path: Path<Uuid>,
    input: Json<EmployeeRateInput>,
    ctx: UserContext,
    config: Data<Config>,
    companies: Data<CompanyRepository>,
    rates: Data<RateRepository>,
) -> Result<HttpResponse, AppError> {
    ctx.requires_manager()?;
    let company_id = ctx.strict_company_id()?;
    let user_id = path.into_inner();

    if input.rates().iter().any(|rate| *rate < 0) {
        return Err(AppError::BadRequest("Rates must not be negative".to_string()));
    }
    if let Some(valid_to) = input.valid_to {
        if valid_to < input.valid_from {
            return Err(AppError::BadRequest(
                "validTo must not be before validFrom".to_string(),
            ));
        }
    }
    if companies.member_role(user_id, company_id).await?.is_none() {
        return Err(AppError::NotFound(
            "Employee not found in this company".to_string(),
        ));
    }

    let currency = normalize_currency(input.currency.as_deref(), &config.default_currency)?;

    let rate = rates
        .set_employee_rate(user_id, company_id, &currency, &input)
        .await?;

    log::info!(
        "User {} set rates for {} from {}",
        ctx.user_id(),
        user_id,
        rate.valid_from
    );

    Ok(ApiResponse::ok(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, http::StatusCode};
    use pretty_assertions::assert_eq;

    #[test]
    fn currency_is_uppercased_or_defaulted() {
        assert_eq!(normalize_currency(Some("eur"), "USD").unwrap(), "EUR");
        assert_eq!(normalize_currency(None, "USD").unwrap(), "USD");
    }

    #[test]
    fn currency_must_be_three_letters() {
        for bad in ["EURO", "US", "U$D", ""] {
            let err = normalize_currency(Some(bad), "USD").unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
