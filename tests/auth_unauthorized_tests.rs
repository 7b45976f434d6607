use actix_web::{http::StatusCode, test};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use shiftmate::Config;

#[macro_use]
mod common;

// Requests here are rejected before any query runs, so the pool never
// connects.
macro_rules! test_unauthorized {
    ($test_name:ident, $method:ident, $uri:expr) => {
        #[actix_web::test]
        #[serial]
        async fn $test_name() {
            common::setup_test_env();
            let config = Config::test_config();
            let app = test_app!(common::lazy_pool(&config), config);

            let req = test::TestRequest::$method().uri($uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    };
}

test_unauthorized!(me_requires_token, get, "/api/v1/auth/me");
test_unauthorized!(logout_all_requires_token, post, "/api/v1/auth/logout-all");
test_unauthorized!(companies_require_token, get, "/api/v1/companies");
test_unauthorized!(shifts_require_token, get, "/api/v1/shifts");
test_unauthorized!(roster_requires_token, get, "/api/v1/roster?weekStart=2026-10-12");
test_unauthorized!(time_off_requires_token, get, "/api/v1/time-off");
test_unauthorized!(rate_tiers_require_token, get, "/api/v1/rates/tiers");
test_unauthorized!(holidays_require_token, get, "/api/v1/holidays");
test_unauthorized!(
    earnings_require_token,
    get,
    "/api/v1/earnings?startDate=2026-10-01&endDate=2026-10-31"
);
test_unauthorized!(stats_require_token, get, "/api/v1/stats");
test_unauthorized!(invites_list_requires_token, get, "/api/v1/invites");

#[actix_web::test]
#[serial]
async fn malformed_bearer_token_is_rejected() {
    let config = Config::test_config();
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthorized: Invalid token");
}

#[actix_web::test]
#[serial]
async fn expired_access_token_is_rejected() {
    let config = Config::test_config();
    let issued = Utc::now() - Duration::hours(2);
    let token = common::access_token_at(&config, issued);
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::get()
        .uri("/api/v1/shifts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthorized: Access token expired");
}

#[actix_web::test]
#[serial]
async fn token_signed_with_another_secret_is_rejected() {
    let mut other = Config::test_config();
    other.jwt_secret = "a-completely-different-secret-value".to_string();
    let token = common::access_token_at(&other, Utc::now());

    let config = Config::test_config();
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::get()
        .uri("/api/v1/stats")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn malformed_refresh_token_is_rejected() {
    let config = Config::test_config();
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refreshToken": "garbage" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn logout_with_unknown_token_still_succeeds() {
    let config = Config::test_config();
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .set_json(json!({ "refreshToken": "garbage" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn registration_is_validated_before_storage() {
    let config = Config::test_config();
    let app = test_app!(common::lazy_pool(&config), config);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": "not-an-email",
            "password": "long-enough-password",
            "name": "Pat"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
