pub mod restaurant_handlers;
pub mod admin_handlers;
pub mod notification_handlers;
