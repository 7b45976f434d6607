use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{CompanyInfo, CompanyRole, User};
use crate::database::repositories::{CompanyRepository, UserRepository};
use crate::error::AppError;
use crate::services::auth::Claims;

/// The authenticated user and the company their access token is scoped to.
/// Resolved per request from the bearer token; nothing is kept between
/// requests.
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub user: User,
    pub company: Option<CompanyInfo>,
}

impl UserContext {
    pub async fn from_claims(
        claims: &Claims,
        user_repository: &UserRepository,
        company_repository: &CompanyRepository,
    ) -> Result<Self, AppError> {
        let user = user_repository
            .find_by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        // Membership is re-read so role changes apply before the token expires
        let company = match claims.company_id {
            Some(company_id) => {
                company_repository
                    .find_company_info(user.id, company_id)
                    .await?
            }
            None => None,
        };

        Ok(UserContext { user, company })
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.company.as_ref().map(|c| c.id)
    }

    pub fn role(&self) -> Option<CompanyRole> {
        self.company.as_ref().map(|c| c.role)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), Some(CompanyRole::Admin))
    }

    pub fn is_manager_or_admin(&self) -> bool {
        self.role().is_some_and(|role| role.is_manager_or_admin())
    }

    /// The active company, or 400 when the token carries none.
    pub fn strict_company_id(&self) -> Result<Uuid, AppError> {
        self.company_id().ok_or_else(|| {
            AppError::BadRequest("No active company. Switch to a company first".to_string())
        })
    }

    pub fn requires_company(&self) -> Result<&CompanyInfo, AppError> {
        self.company.as_ref().ok_or_else(|| {
            AppError::BadRequest("No active company. Switch to a company first".to_string())
        })
    }

    pub fn requires_manager(&self) -> Result<(), AppError> {
        self.requires_company()?;
        if self.is_manager_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Manager or admin role required".to_string(),
            ))
        }
    }

    pub fn requires_admin(&self) -> Result<(), AppError> {
        self.requires_company()?;
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Users may act on their own resources; managers on anyone's in
    /// their company.
    pub fn requires_same_user_or_manager(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.user_id() == owner_id || self.is_manager_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only access your own records".to_string(),
            ))
        }
    }

    /// Resources tied to another company are reported as missing.
    pub fn requires_same_company(&self, company_id: Option<Uuid>) -> Result<(), AppError> {
        match company_id {
            Some(id) if self.company_id() != Some(id) => {
                Err(AppError::NotFound("Resource not found".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl FromRequest for UserContext {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let claims = Claims::from_request(req, payload).into_inner();
        let user_repository = req.app_data::<Data<UserRepository>>().cloned();
        let company_repository = req.app_data::<Data<CompanyRepository>>().cloned();

        Box::pin(async move {
            let claims = claims?;
            let (Some(user_repository), Some(company_repository)) =
                (user_repository, company_repository)
            else {
                log::error!("User or company repository missing from app data");
                return Err(AppError::internal_server_error());
            };

            UserContext::from_claims(&claims, &user_repository, &company_repository).await
        })
    }
}
