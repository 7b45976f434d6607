use actix_web::web;

use crate::handlers::{billing, earnings, holidays, rates, stats};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rates")
            .route("/tiers", web::get().to(rates::get_rate_tiers))
            .route("/tiers/{day_type}", web::put().to(rates::replace_rate_tiers))
            .route("/employees/{user_id}", web::get().to(rates::get_employee_rates))
            .route("/employees/{user_id}", web::put().to(rates::set_employee_rate)),
    )
    .service(
        web::scope("/holidays")
            .route("", web::get().to(holidays::get_holidays))
            .route("", web::post().to(holidays::create_holiday))
            .route("/{date}", web::get().to(holidays::get_holiday)),
    )
    .service(
        web::scope("/billing")
            .route("", web::get().to(billing::bill_range))
            .route("/quote", web::post().to(billing::quote))
            .route("/shifts/{id}", web::get().to(billing::price_shift)),
    )
    .route("/earnings", web::get().to(earnings::get_earnings))
    .route("/stats", web::get().to(stats::get_my_stats));
}
