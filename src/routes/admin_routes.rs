use actix_web::web;
use crate::handlers::admin_handlers;
use crate::routes::notification_scope;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .route("/restaurant-approvals", web::get().to(admin_handlers::list_restaurant_approvals))
            .route("/restaurant-approvals/{id}", web::put().to(admin_handlers::resolve_restaurant_approval))
            .service(notification_scope()),
    );
}
