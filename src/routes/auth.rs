use actix_web::web;

use crate::handlers::auth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .route("/refresh", web::post().to(auth::refresh))
            .route("/logout", web::post().to(auth::logout))
            .route("/logout-all", web::post().to(auth::logout_all))
            .route("/switch-company", web::post().to(auth::switch_company))
            .route("/me", web::get().to(auth::me)),
    );
}
