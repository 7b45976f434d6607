#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use shiftmate::Config;
use shiftmate::database::models::User;
use shiftmate::services::auth::create_access_token;

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A pool that never connects unless a query runs. Enough for requests
/// rejected before touching the database.
pub fn lazy_pool(config: &Config) -> PgPool {
    PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("valid database url")
}

/// A migrated pool for the database named by `TEST_DATABASE_URL`, or `None`
/// when the variable is unset.
pub async fn live_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = shiftmate::database::init_database(&url)
        .await
        .expect("test database reachable");
    Some(pool)
}

pub fn access_token_at(config: &Config, now: DateTime<Utc>) -> String {
    let user = User::new(
        "someone@example.com".to_string(),
        "hash".to_string(),
        "Someone".to_string(),
    );
    create_access_token(config, &user, None, now)
        .expect("token signs")
        .0
}

/// Builds the full application around `$pool` and `$config`.
macro_rules! test_app {
    ($pool:expr, $config:expr) => {{
        use actix_web::{App, test, web};
        use shiftmate::database::repositories::*;
        use shiftmate::{AuthService, BillingService, HolidayRegistry};

        let pool: sqlx::PgPool = $pool;
        let config: shiftmate::Config = $config;

        let users = UserRepository::new(pool.clone());
        let companies = CompanyRepository::new(pool.clone());
        let rates = RateRepository::new(pool.clone());
        let auth = AuthService::new(
            config.clone(),
            users.clone(),
            companies.clone(),
            RefreshTokenRepository::new(pool.clone()),
        );
        let registry = HolidayRegistry::new(
            HolidayRepository::new(pool.clone()),
            config.holiday_cache_ttl_secs,
        );
        let billing =
            BillingService::new(rates.clone(), registry.clone(), config.default_currency.clone());

        test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(pool.clone()))
                .app_data(web::Data::new(users))
                .app_data(web::Data::new(companies))
                .app_data(web::Data::new(InviteRepository::new(pool.clone())))
                .app_data(web::Data::new(ShiftRepository::new(pool.clone())))
                .app_data(web::Data::new(TimeOffRepository::new(pool.clone())))
                .app_data(web::Data::new(rates))
                .app_data(web::Data::new(auth))
                .app_data(web::Data::new(registry))
                .app_data(web::Data::new(billing))
                .wrap(shiftmate::middleware::RequestId)
                .configure(shiftmate::routes::configure),
        )
        .await
    }};
}
