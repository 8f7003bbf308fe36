mod mongodb;
pub mod approval_service;
mod notification_service;

pub use mongodb::MongoDBService;
pub use approval_service::ApprovalService;
pub use notification_service::NotificationService;
