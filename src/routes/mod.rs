mod restaurant_routes;
mod admin_routes;
mod notification_routes;

pub use notification_routes::notification_scope;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    restaurant_routes::configure(cfg);
    admin_routes::configure(cfg);
    notification_routes::configure(cfg);
}
