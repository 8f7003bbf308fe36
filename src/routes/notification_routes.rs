use actix_web::dev::HttpServiceFactory;
use actix_web::web;

use crate::handlers::notification_handlers;

/// The notification endpoints are mounted under each role prefix
/// (/api/admin, /api/restaurant, /api/user) with identical semantics;
/// the acting user's inbox selector does the scoping.
pub fn notification_scope() -> impl HttpServiceFactory {
    web::scope("/notifications")
        .route("", web::get().to(notification_handlers::list_notifications))
        .route("/unread-count", web::get().to(notification_handlers::unread_count))
        .route("/mark-all-read", web::put().to(notification_handlers::mark_all_read))
        .route("/{id}/read", web::put().to(notification_handlers::mark_read))
        .route("/{id}", web::delete().to(notification_handlers::delete_notification))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/user").service(notification_scope()));
}
