use actix_web::web;

use crate::handlers::invites;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invites")
            .route("", web::post().to(invites::create_invite))
            .route("", web::get().to(invites::get_invites))
            .route("/accept", web::post().to(invites::accept_invite))
            .route("/{token}", web::get().to(invites::get_invite)),
    );
}
