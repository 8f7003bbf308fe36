use serde::{Deserialize, Serialize};
use mongodb::bson::{self, oid::ObjectId, Document};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    #[serde(rename = "profile_change_requested")]
    ProfileChangeRequested,
    #[serde(rename = "profile_change_approved")]
    ProfileChangeApproved,
    #[serde(rename = "profile_change_rejected")]
    ProfileChangeRejected,
    #[serde(rename = "system")]
    System,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    User(ObjectId),
    /// Broadcast to the shared admin inbox.
    Admins,
}

/// One inbox entry. Addressed either to a single user or, when
/// `is_admin_notification` is set and `user_id` is empty, to all admins.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    #[serde(default)]
    pub is_admin_notification: bool,
    #[serde(default)]
    pub is_read: bool,
    /// Free-form payload, typically the related approval/restaurant ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Document>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: Recipient,
        notification_type: NotificationType,
        title: String,
        message: String,
        data: Option<Document>,
    ) -> Self {
        let (user_id, is_admin_notification) = match recipient {
            Recipient::User(id) => (Some(id), false),
            Recipient::Admins => (None, true),
        };
        Self {
            id: None,
            notification_type,
            title,
            message,
            user_id,
            is_admin_notification,
            is_read: false,
            data,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_admin_broadcast_has_no_user_id() {
        let n = Notification::new(
            Recipient::Admins,
            NotificationType::ProfileChangeRequested,
            "Profile change requested".to_string(),
            "Momo Palace requested changes".to_string(),
            Some(doc! { "approvalId": ObjectId::new() }),
        );
        assert!(n.is_admin_notification);
        assert!(n.user_id.is_none());
        assert!(!n.is_read);
        assert!(n.data.unwrap().get_object_id("approvalId").is_ok());
    }

    #[test]
    fn test_user_notification_is_addressed() {
        let uid = ObjectId::new();
        let n = Notification::new(
            Recipient::User(uid),
            NotificationType::ProfileChangeRejected,
            "Changes rejected".to_string(),
            "PAN number invalid".to_string(),
            None,
        );
        assert!(!n.is_admin_notification);
        assert_eq!(n.user_id, Some(uid));
    }
}
