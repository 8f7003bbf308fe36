use actix_web::web;
use crate::handlers::restaurant_handlers;
use crate::routes::notification_scope;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/restaurant")
            .route("/profile", web::get().to(restaurant_handlers::get_profile))
            .route("/profile", web::post().to(restaurant_handlers::submit_profile_changes))
            // Alternate submission endpoint kept for the older client
            .route("/profile/changes", web::post().to(restaurant_handlers::submit_profile_changes))
            .route("/profile/changes/status", web::get().to(restaurant_handlers::get_pending_changes))
            .route("/pending-changes", web::get().to(restaurant_handlers::get_pending_changes))
            .service(notification_scope()),
    );
}
