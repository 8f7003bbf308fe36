use serde::{Deserialize, Serialize};
use mongodb::bson::{self, oid::ObjectId};
use chrono::{DateTime, Utc};

use crate::models::{ProfileFields, RestaurantStatus};

mod option_datetime_as_bson {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use chrono::{DateTime, Utc};
    use mongodb::bson;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// One pending or resolved profile change request. `pending` is the only
/// mutable state; `approved` and `rejected` are terminal, no re-entry.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantApproval {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub restaurant_id: ObjectId,
    pub current_data: ProfileFields,
    pub requested_data: ProfileFields,
    pub status: ApprovalStatus,
    /// Restaurant status at submission time; restored on rejection.
    pub previous_status: RestaurantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none", with = "option_datetime_as_bson", default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl RestaurantApproval {
    pub fn new(
        restaurant_id: ObjectId,
        current_data: ProfileFields,
        requested_data: ProfileFields,
        previous_status: RestaurantStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            restaurant_id,
            current_data,
            requested_data,
            status: ApprovalStatus::Pending,
            previous_status,
            rejection_reason: None,
            processed_by: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    /// Field keys the owner actually proposed to change.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.current_data.changed_fields(&self.requested_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_approval_is_pending() {
        let approval = RestaurantApproval::new(
            ObjectId::new(),
            ProfileFields::default(),
            ProfileFields::default(),
            RestaurantStatus::Approved,
        );
        assert!(approval.is_pending());
        assert!(approval.rejection_reason.is_none());
        assert!(approval.processed_at.is_none());
        assert!(approval.changed_fields().is_empty());
    }

    #[test]
    fn test_changed_fields_reflect_requested_diff() {
        let current = ProfileFields { delivery_fee: Some(2.0), ..Default::default() };
        let requested = current.overlay(&ProfileFields { delivery_fee: Some(3.5), ..Default::default() });
        let approval = RestaurantApproval::new(ObjectId::new(), current, requested, RestaurantStatus::Approved);
        assert_eq!(approval.changed_fields(), vec!["deliveryFee"]);
    }
}
