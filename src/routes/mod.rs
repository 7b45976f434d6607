use actix_web::web;

pub mod auth;
pub mod company;
pub mod invites;
pub mod pay;
pub mod shifts;
pub mod time_off;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::configure)
            .configure(company::configure)
            .configure(invites::configure)
            .configure(shifts::configure)
            .configure(time_off::configure)
            .configure(pay::configure),
    );
}
