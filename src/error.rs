use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::handlers::shared::ApiResponse;

/// Failures of the pay and time arithmetic. These are local validation
/// errors scoped to a single computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayError {
    #[error("Rate configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Invalid tier schedule: {0}")]
    InvalidTierSchedule(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Mixed currencies: {0}")]
    MixedCurrency(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    ConfigurationMissing(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ConfigurationMissing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Don't leak driver details to clients
        let error_message = match self {
            AppError::DatabaseError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        if status_code.is_server_error() {
            log::error!("Request failed with status {}: {}", status_code, self);
        } else {
            log::warn!("Request failed with status {}: {}", status_code, error_message);
        }

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(&error_message))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            error => {
                log::error!("Database error: {}", error);
                AppError::DatabaseError(error)
            }
        }
    }
}

impl From<PayError> for AppError {
    fn from(error: PayError) -> Self {
        match error {
            PayError::ConfigurationMissing(_) | PayError::MixedCurrency(_) => {
                AppError::ConfigurationMissing(error.to_string())
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        log::error!("Password hashing error: {}", error);
        AppError::internal_server_error()
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        log::error!("Token encoding error: {}", error);
        AppError::internal_server_error()
    }
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<AppError>() {
            Ok(app_err) => return app_err,
            Err(error) => error,
        };

        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(original_error) => match original_error.downcast::<PayError>() {
                Ok(pay_err) => AppError::from(pay_err),
                Err(original_error) => {
                    log::error!("Unhandled error: {:#}", original_error);
                    AppError::InternalServerError(Some(original_error.to_string()))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn configuration_missing_maps_to_unprocessable_entity() {
        let err: AppError =
            PayError::ConfigurationMissing("no sunday tiers for company 5".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.to_string(),
            "Rate configuration missing: no sunday tiers for company 5"
        );
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err: AppError = PayError::InvalidDateRange { start, end }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = PayError::InvalidDuration("-1 hours".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn anyhow_wrapping_pay_error_keeps_its_status() {
        let err = AppError::from(anyhow::Error::new(PayError::ConfigurationMissing(
            "x".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn anyhow_wrapping_app_error_is_unwrapped() {
        let err = AppError::from(anyhow::Error::new(AppError::Forbidden(
            "managers only".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_error_message_is_optional() {
        assert_eq!(
            AppError::internal_server_error().to_string(),
            "Internal server error"
        );
        assert_eq!(
            AppError::internal_server_error_message("boom").to_string(),
            "Internal server error: boom"
        );
    }
}
