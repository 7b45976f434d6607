use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    AuthResponse, CompanyInfo, CompanyRole, CreateUserInput, LoginInput, TokenPair, User,
};
use crate::database::repositories::{
    CompanyRepository, NewRefreshToken, RefreshTokenRepository, UserRepository,
};
use crate::error::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;
const REFRESH_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub company_id: Option<Uuid>,
    pub role: Option<CompanyRole>,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Signs a short-lived access token for `user`, scoped to `company` when
/// one is active.
pub fn create_access_token(
    config: &Config,
    user: &User,
    company: Option<&CompanyInfo>,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), AppError> {
    let expires_at = now + Duration::minutes(config.access_token_ttl_minutes);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        company_id: company.map(|c| c.id),
        role: company.map(|c| c.role),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )?;

    Ok((token, expires_at))
}

pub fn decode_access_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => AppError::unauthorized("Access token expired"),
        _ => AppError::unauthorized("Invalid token"),
    })
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data");
            return ready(Err(AppError::internal_server_error()));
        };

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match token {
            Some(token) => ready(decode_access_token(config, token.trim())),
            None => ready(Err(AppError::unauthorized(
                "Missing or invalid authorization header",
            ))),
        }
    }
}

/// Opaque refresh credential, `"{id}.{secret}"`. The id locates the stored
/// record; only a bcrypt hash of the secret is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshCredential {
    pub id: Uuid,
    pub secret: String,
}

impl RefreshCredential {
    pub fn generate() -> Self {
        let mut bytes = [0u8; REFRESH_SECRET_BYTES];
        rand::rng().fill(&mut bytes[..]);

        Self {
            id: Uuid::new_v4(),
            secret: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        let (id, secret) = token.trim().split_once('.')?;
        let id = Uuid::parse_str(id).ok()?;
        if secret.is_empty() {
            return None;
        }

        Some(Self {
            id,
            secret: secret.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.id, self.secret)
    }

    pub fn hash_secret(&self, cost: u32) -> Result<String, AppError> {
        Ok(hash(&self.secret, cost)?)
    }

    /// bcrypt verification compares in constant time.
    pub fn matches(&self, token_hash: &str) -> bool {
        verify(&self.secret, token_hash).unwrap_or(false)
    }
}

pub fn validate_registration(input: &CreateUserInput) -> Result<(), AppError> {
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if input.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AuthService {
    config: Config,
    user_repository: UserRepository,
    company_repository: CompanyRepository,
    refresh_token_repository: RefreshTokenRepository,
}

impl AuthService {
    pub fn new(
        config: Config,
        user_repository: UserRepository,
        company_repository: CompanyRepository,
        refresh_token_repository: RefreshTokenRepository,
    ) -> Self {
        Self {
            config,
            user_repository,
            company_repository,
            refresh_token_repository,
        }
    }

    /// Hashes a password the way every stored account password is hashed.
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        Ok(hash(password, DEFAULT_COST)?)
    }

    pub async fn register(&self, input: CreateUserInput) -> Result<AuthResponse, AppError> {
        validate_registration(&input)?;

        if self.user_repository.email_exists(&input.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = Self::hash_password(&input.password)?;
        let user = User::new(input.email, password_hash, input.name.trim().to_string());
        let user = self.user_repository.create_user(&user).await?;
        log::info!("Registered user {}", user.id);

        let tokens = self.issue_pair(&user, None).await?;

        Ok(AuthResponse {
            tokens,
            user: user.into(),
            company: None,
        })
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::unauthorized("Invalid email or password");

        let user = self
            .user_repository
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify(&input.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(invalid());
        }

        let companies = self.company_repository.get_companies_for_user(user.id).await?;
        let company = companies
            .iter()
            .find(|c| c.is_primary)
            .or_else(|| companies.first())
            .cloned();

        let tokens = self.issue_pair(&user, company.as_ref()).await?;

        Ok(AuthResponse {
            tokens,
            user: user.into(),
            company,
        })
    }

    /// Exchanges a refresh credential for a new pair. The presented
    /// credential is revoked and linked to its replacement. Presenting an
    /// already revoked credential revokes every session of its owner.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let now = Utc::now();
        let credential = RefreshCredential::parse(refresh_token)
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let record = self
            .refresh_token_repository
            .find_by_id(credential.id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if !credential.matches(&record.token_hash) {
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        if record.is_revoked() {
            let revoked = self
                .refresh_token_repository
                .revoke_all_for_user(record.user_id)
                .await?;
            log::warn!(
                "Revoked refresh token {} reused; revoked {} active session(s) of user {}",
                record.id,
                revoked,
                record.user_id
            );
            return Err(AppError::unauthorized("Refresh token has been revoked"));
        }

        if record.is_expired_at(now) {
            return Err(AppError::unauthorized("Refresh token expired"));
        }

        let user = self
            .user_repository
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        // Membership may have been removed since the token was issued
        let company = match record.company_id {
            Some(company_id) => {
                self.company_repository
                    .find_company_info(user.id, company_id)
                    .await?
            }
            None => None,
        };

        let replacement = RefreshCredential::generate();
        let stored = self.new_record(&replacement, &user, company.as_ref(), now)?;
        let refresh_expires_at = stored.expires_at;

        if !self
            .refresh_token_repository
            .rotate(record.id, stored)
            .await?
        {
            return Err(AppError::unauthorized("Refresh token has been revoked"));
        }

        let (access_token, access_expires_at) =
            create_access_token(&self.config, &user, company.as_ref(), now)?;

        Ok(AuthResponse {
            tokens: TokenPair {
                access_token,
                access_token_expires_at: access_expires_at,
                refresh_token: replacement.encode(),
                refresh_token_expires_at: refresh_expires_at,
            },
            user: user.into(),
            company,
        })
    }

    /// Revokes one refresh credential. Unknown or malformed credentials are
    /// ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let Some(credential) = RefreshCredential::parse(refresh_token) else {
            return Ok(());
        };

        if let Some(record) = self
            .refresh_token_repository
            .find_by_id(credential.id)
            .await?
        {
            if credential.matches(&record.token_hash) {
                self.refresh_token_repository.revoke(record.id).await?;
            }
        }

        Ok(())
    }

    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self
            .refresh_token_repository
            .revoke_all_for_user(user_id)
            .await?;
        log::info!("Revoked {} session(s) of user {}", revoked, user_id);

        Ok(revoked)
    }

    pub async fn switch_company(
        &self,
        user: &User,
        company_id: Uuid,
    ) -> Result<AuthResponse, AppError> {
        let company = self
            .company_repository
            .find_company_info(user.id, company_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("You are not a member of this company".to_string()))?;

        let tokens = self.issue_pair(user, Some(&company)).await?;

        Ok(AuthResponse {
            tokens,
            user: user.clone().into(),
            company: Some(company),
        })
    }

    pub async fn issue_pair(
        &self,
        user: &User,
        company: Option<&CompanyInfo>,
    ) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let (access_token, access_token_expires_at) =
            create_access_token(&self.config, user, company, now)?;

        let credential = RefreshCredential::generate();
        let record = self.new_record(&credential, user, company, now)?;
        let refresh_token_expires_at = record.expires_at;
        self.refresh_token_repository.create(&record).await?;

        Ok(TokenPair {
            access_token,
            access_token_expires_at,
            refresh_token: credential.encode(),
            refresh_token_expires_at,
        })
    }

    fn new_record(
        &self,
        credential: &RefreshCredential,
        user: &User,
        company: Option<&CompanyInfo>,
        now: DateTime<Utc>,
    ) -> Result<NewRefreshToken, AppError> {
        Ok(NewRefreshToken {
            id: credential.id,
            user_id: user.id,
            company_id: company.map(|c| c.id),
            token_hash: credential.hash_secret(self.config.refresh_token_hash_cost)?,
            expires_at: now + Duration::days(self.config.refresh_token_ttl_days),
        })
    }
}
