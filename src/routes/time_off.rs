use actix_web::web;

use crate::handlers::time_off;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/time-off")
            .route("", web::post().to(time_off::create_time_off_request))
            .route("", web::get().to(time_off::get_time_off_requests))
            .route(
                "/{id}/approve",
                web::post().to(time_off::approve_time_off_request),
            )
            .route("/{id}/deny", web::post().to(time_off::deny_time_off_request))
            .route(
                "/{id}/cancel",
                web::post().to(time_off::cancel_time_off_request),
            ),
    );
}
