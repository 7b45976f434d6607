//! End-to-end flows against a real Postgres. Skipped unless
//! `TEST_DATABASE_URL` is set.

use actix_web::{http::StatusCode, test};
use chrono::{Days, Utc};
use fake::Fake;
use fake::faker::{internet::en::SafeEmail, name::en::Name};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use serial_test::serial;
use shiftmate::Config;
use uuid::Uuid;

#[macro_use]
mod common;

fn unique_email() -> String {
    let email: String = SafeEmail().fake();
    format!("{}-{}", Uuid::new_v4().simple(), email)
}

fn any_name() -> String {
    Name().fake()
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
#[serial]
async fn refresh_rotation_and_reuse_detection() {
    common::setup_test_env();
    let Some(pool) = common::live_pool().await else {
        return;
    };
    let app = test_app!(pool, Config::test_config());

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email(),
                "password": "correct-horse-battery",
                "name": any_name()
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let first = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refreshToken": first }))
    );
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // Replaying the rotated token revokes the whole family
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refreshToken": first }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refreshToken": second }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn company_tiers_price_a_quote() {
    common::setup_test_env();
    let Some(pool) = common::live_pool().await else {
        return;
    };
    let app = test_app!(pool, Config::test_config());

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email(),
                "password": "correct-horse-battery",
                "name": any_name()
            }))
    );
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/companies")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "name": "Harbour Cafe" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let company_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/switch-company")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "companyId": company_id }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company"]["role"], "admin");
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    let bearer = ("Authorization", format!("Bearer {}", token));

    // No tiers yet
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/billing/quote")
            .insert_header(bearer.clone())
            .set_json(json!({ "date": "2026-10-12", "hours": 10.0 }))
    );
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/v1/rates/tiers/weekday")
            .insert_header(bearer.clone())
            .set_json(json!({
                "currency": "USD",
                "validFrom": "2020-01-01",
                "tiers": [
                    { "tierOrder": 1, "hoursInTier": 8.0, "ratePerHour": 2500 },
                    { "tierOrder": 2, "hoursInTier": null, "ratePerHour": 3750 }
                ]
            }))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/billing/quote")
            .insert_header(bearer.clone())
            .set_json(json!({ "date": "2026-10-12", "hours": 10.0 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dayType"], "weekday");
    assert_eq!(body["data"]["pay"]["totalAmount"], 27500);

    // A gap in tier order is refused
    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/v1/rates/tiers/sunday")
            .insert_header(bearer)
            .set_json(json!({
                "validFrom": "2020-01-01",
                "tiers": [
                    { "tierOrder": 1, "hoursInTier": 8.0, "ratePerHour": 2500 },
                    { "tierOrder": 3, "hoursInTier": null, "ratePerHour": 3750 }
                ]
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn scheduled_tiers_leave_current_group_in_place() {
    common::setup_test_env();
    let Some(pool) = common::live_pool().await else {
        return;
    };
    let app = test_app!(pool, Config::test_config());

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email(),
                "password": "correct-horse-battery",
                "name": any_name()
            }))
    );
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/companies")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "name": "Night Market" }))
    );
    let company_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/switch-company")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "companyId": company_id }))
    );
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    let bearer = ("Authorization", format!("Bearer {}", token));

    let today = Utc::now().date_naive();
    let next_month = today + Days::new(30);

    for (valid_from, rate) in [("2020-01-01".to_string(), 2500), (next_month.to_string(), 4000)] {
        let (status, _) = send!(
            app,
            test::TestRequest::put()
                .uri("/api/v1/rates/tiers/weekday")
                .insert_header(bearer.clone())
                .set_json(json!({
                    "currency": "usd",
                    "validFrom": valid_from,
                    "tiers": [{ "tierOrder": 1, "hoursInTier": null, "ratePerHour": rate }]
                }))
        );
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/rates/tiers?dayType=weekday&onDate={}", today))
            .insert_header(bearer.clone())
    );
    assert_eq!(status, StatusCode::OK);
    let current = body["data"].as_array().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["ratePerHour"], 2500);
    assert_eq!(current[0]["currency"], "USD");
    assert_eq!(current[0]["validTo"], (next_month - Days::new(1)).to_string());

    let (_, body) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/rates/tiers?dayType=weekday&onDate={}", next_month))
            .insert_header(bearer.clone())
    );
    assert_eq!(body["data"][0]["ratePerHour"], 4000);

    // A code longer than three letters is a bad request
    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/v1/rates/tiers/saturday")
            .insert_header(bearer)
            .set_json(json!({
                "currency": "EURO",
                "validFrom": "2020-01-01",
                "tiers": [{ "tierOrder": 1, "hoursInTier": null, "ratePerHour": 3000 }]
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
