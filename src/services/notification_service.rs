use std::sync::Arc;

use log::info;
use mongodb::bson::{doc, oid::ObjectId, Document};

use crate::auth::AuthUser;
use crate::models::{ApiError, Notification, NotificationType, Recipient};
use crate::services::MongoDBService;

/// Inbox selector for the acting user. Admins see the shared admin
/// broadcasts plus anything addressed to them directly; everyone else
/// sees only their own rows.
pub fn recipient_filter(user: &AuthUser) -> Document {
    if user.is_admin() {
        doc! {
            "$or": [
                { "isAdminNotification": true },
                { "userId": user.user_id },
            ]
        }
    } else {
        doc! { "userId": user.user_id, "isAdminNotification": false }
    }
}

pub struct NotificationService {
    mongodb_service: Arc<MongoDBService>,
}

impl NotificationService {
    pub fn new(mongodb_service: Arc<MongoDBService>) -> Self {
        Self { mongodb_service }
    }

    /// Append one inbox entry. No delivery guarantee beyond the write;
    /// clients poll the list and unread-count endpoints.
    pub async fn notify(
        &self,
        recipient: Recipient,
        notification_type: NotificationType,
        title: String,
        message: String,
        data: Option<Document>,
    ) -> Result<ObjectId, ApiError> {
        let notification = Notification::new(recipient, notification_type, title, message, data);
        let id = self.mongodb_service.insert_notification(&notification).await?;
        info!("Notification {} created ({:?})", id, notification.notification_type);
        Ok(id)
    }

    pub async fn list(&self, user: &AuthUser) -> Result<Vec<Notification>, ApiError> {
        self.mongodb_service.list_notifications(recipient_filter(user)).await
    }

    pub async fn unread_count(&self, user: &AuthUser) -> Result<u64, ApiError> {
        self.mongodb_service
            .count_unread_notifications(recipient_filter(user))
            .await
    }

    pub async fn mark_read(&self, id: &ObjectId, user: &AuthUser) -> Result<(), ApiError> {
        let matched = self
            .mongodb_service
            .mark_notification_read(id, recipient_filter(user))
            .await?;
        if matched {
            Ok(())
        } else {
            // Same answer for "doesn't exist" and "not yours"
            Err(ApiError::NotFound(format!("Notification {} not found", id)))
        }
    }

    pub async fn mark_all_read(&self, user: &AuthUser) -> Result<u64, ApiError> {
        self.mongodb_service
            .mark_all_notifications_read(recipient_filter(user))
            .await
    }

    pub async fn delete(&self, id: &ObjectId, user: &AuthUser) -> Result<(), ApiError> {
        let deleted = self
            .mongodb_service
            .delete_notification(id, recipient_filter(user))
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("Notification {} not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn actor(role: Role) -> AuthUser {
        AuthUser {
            user_id: ObjectId::new(),
            role,
        }
    }

    #[test]
    fn test_owner_selector_is_scoped_to_own_rows() {
        let owner = actor(Role::Restaurant);
        let filter = recipient_filter(&owner);
        assert_eq!(filter.get_object_id("userId").unwrap(), owner.user_id);
        assert!(!filter.get_bool("isAdminNotification").unwrap());
    }

    #[test]
    fn test_admin_selector_includes_broadcasts() {
        let admin = actor(Role::Admin);
        let filter = recipient_filter(&admin);
        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn test_selectors_do_not_cross_contaminate() {
        let a = actor(Role::Customer);
        let b = actor(Role::Customer);
        assert_ne!(
            recipient_filter(&a).get_object_id("userId").unwrap(),
            recipient_filter(&b).get_object_id("userId").unwrap()
        );
    }
}
