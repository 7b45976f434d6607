use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;
use chrono::Utc;

use shiftmate::database::{
    init_database,
    repositories::{
        CompanyRepository, HolidayRepository, InviteRepository, RateRepository,
        RefreshTokenRepository, ShiftRepository, TimeOffRepository, UserRepository,
    },
};
use shiftmate::middleware::RequestId;
use shiftmate::{AuthService, BillingService, Config, HolidayRegistry, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("ShiftMate API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    log::info!("Starting ShiftMate API server...");

    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {}, night shifts from {})",
        config.environment,
        config.night_shift_cutoff.format("%H:%M")
    );

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let user_repository = UserRepository::new(pool.clone());
    let company_repository = CompanyRepository::new(pool.clone());
    let refresh_token_repository = RefreshTokenRepository::new(pool.clone());
    let invite_repository = InviteRepository::new(pool.clone());
    let shift_repository = ShiftRepository::new(pool.clone());
    let time_off_repository = TimeOffRepository::new(pool.clone());
    let rate_repository = RateRepository::new(pool.clone());
    let holiday_repository = HolidayRepository::new(pool.clone());

    let purged = refresh_token_repository.delete_expired(Utc::now()).await?;
    if purged > 0 {
        log::info!("Purged {} expired refresh token(s)", purged);
    }

    let auth_service = AuthService::new(
        config.clone(),
        user_repository.clone(),
        company_repository.clone(),
        refresh_token_repository,
    );
    let holiday_registry = HolidayRegistry::new(holiday_repository, config.holiday_cache_ttl_secs);
    let billing_service = BillingService::new(
        rate_repository.clone(),
        holiday_registry.clone(),
        config.default_currency.clone(),
    );

    let config_data = web::Data::new(config.clone());
    let pool_data = web::Data::new(pool);
    let user_repo_data = web::Data::new(user_repository);
    let company_repo_data = web::Data::new(company_repository);
    let invite_repo_data = web::Data::new(invite_repository);
    let shift_repo_data = web::Data::new(shift_repository);
    let time_off_repo_data = web::Data::new(time_off_repository);
    let rate_repo_data = web::Data::new(rate_repository);
    let auth_service_data = web::Data::new(auth_service);
    let holiday_registry_data = web::Data::new(holiday_registry);
    let billing_service_data = web::Data::new(billing_service);

    let server_address = config.server_address();
    let cors_origin = config.cors_origin.clone();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(pool_data.clone())
            .app_data(user_repo_data.clone())
            .app_data(company_repo_data.clone())
            .app_data(invite_repo_data.clone())
            .app_data(shift_repo_data.clone())
            .app_data(time_off_repo_data.clone())
            .app_data(rate_repo_data.clone())
            .app_data(auth_service_data.clone())
            .app_data(holiday_registry_data.clone())
            .app_data(billing_service_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestId)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
