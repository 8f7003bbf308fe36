use serde::{Deserialize, Serialize};
use mongodb::bson::{self, oid::ObjectId};
use chrono::{DateTime, Utc};

use crate::models::{ProfileFields, User};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RestaurantStatus {
    #[serde(rename = "pending_approval")]
    PendingApproval,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    Rejected,
}

impl std::fmt::Display for RestaurantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestaurantStatus::PendingApproval => write!(f, "pending_approval"),
            RestaurantStatus::Approved => write!(f, "approved"),
            RestaurantStatus::Rejected => write!(f, "rejected"),
        }
    }
}

fn default_is_open() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Exactly one restaurant per owner, backed by a unique index.
    pub owner_id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cuisine: Vec<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub delivery_radius: Option<f64>,
    #[serde(default)]
    pub minimum_order: Option<f64>,
    #[serde(default)]
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pan_number: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default = "default_is_open")]
    pub is_open: bool,
    pub status: RestaurantStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// Full snapshot of the tracked profile fields, every slot populated.
    /// Contact fields fall back to the owner account when the storefront
    /// has none of its own.
    pub fn profile_snapshot(&self, owner: &User) -> ProfileFields {
        ProfileFields {
            name: Some(self.name.clone()),
            description: Some(self.description.clone().unwrap_or_default()),
            address: Some(self.address.clone().unwrap_or_default()),
            phone: Some(
                self.phone
                    .clone()
                    .or_else(|| owner.phone.clone())
                    .unwrap_or_default(),
            ),
            email: Some(self.email.clone().unwrap_or_else(|| owner.email.clone())),
            cuisine: Some(self.cuisine.clone()),
            opening_hours: Some(self.opening_hours.clone().unwrap_or_default()),
            is_open: Some(self.is_open),
            delivery_radius: Some(self.delivery_radius.unwrap_or(0.0)),
            minimum_order: Some(self.minimum_order.unwrap_or(0.0)),
            delivery_fee: Some(self.delivery_fee.unwrap_or(0.0)),
            logo: Some(self.logo.clone().unwrap_or_default()),
            cover_image: Some(self.cover_image.clone().unwrap_or_default()),
            pan_number: Some(self.pan_number.clone().unwrap_or_default()),
            price_range: Some(self.price_range.clone().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn owner() -> User {
        User {
            id: Some(ObjectId::new()),
            name: "Owner".to_string(),
            email: "owner@example.com".to_string(),
            phone: Some("9800000000".to_string()),
            password_hash: "x".to_string(),
            role: Role::Restaurant,
            is_email_verified: true,
            created_at: Utc::now(),
        }
    }

    fn restaurant(owner_id: ObjectId) -> Restaurant {
        Restaurant {
            id: Some(ObjectId::new()),
            owner_id,
            name: "Momo Palace".to_string(),
            description: None,
            address: Some("12 Thamel Marg".to_string()),
            phone: None,
            email: None,
            cuisine: vec!["nepali".to_string()],
            opening_hours: None,
            delivery_radius: Some(5.0),
            minimum_order: None,
            delivery_fee: Some(2.0),
            logo: None,
            cover_image: None,
            pan_number: None,
            price_range: Some("$$".to_string()),
            is_open: true,
            status: RestaurantStatus::Approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_populates_every_slot() {
        let owner = owner();
        let snapshot = restaurant(owner.id.unwrap()).profile_snapshot(&owner);
        assert_eq!(snapshot.to_set_document().len(), 15);
        // Contact fields fall back to the owner account
        assert_eq!(snapshot.phone.as_deref(), Some("9800000000"));
        assert_eq!(snapshot.email.as_deref(), Some("owner@example.com"));
        assert_eq!(snapshot.delivery_fee, Some(2.0));
    }

    #[test]
    fn test_restaurant_contact_wins_over_owner() {
        let owner = owner();
        let mut r = restaurant(owner.id.unwrap());
        r.phone = Some("9811111111".to_string());
        r.email = Some("shop@momopalace.example".to_string());
        let snapshot = r.profile_snapshot(&owner);
        assert_eq!(snapshot.phone.as_deref(), Some("9811111111"));
        assert_eq!(snapshot.email.as_deref(), Some("shop@momopalace.example"));
    }
}
