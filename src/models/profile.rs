use serde::{Deserialize, Serialize};
use mongodb::bson::{Bson, Document};

use crate::models::ApiError;

/// One optional slot per mutable profile field. "Which fields changed" is
/// answered by structural comparison of two of these, never by ad hoc
/// per-field checks in handlers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_order: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
}

macro_rules! for_each_field {
    ($macro:ident) => {
        $macro!(
            (name, "name"),
            (description, "description"),
            (address, "address"),
            (phone, "phone"),
            (email, "email"),
            (cuisine, "cuisine"),
            (opening_hours, "openingHours"),
            (is_open, "isOpen"),
            (delivery_radius, "deliveryRadius"),
            (minimum_order, "minimumOrder"),
            (delivery_fee, "deliveryFee"),
            (logo, "logo"),
            (cover_image, "coverImage"),
            (pan_number, "panNumber"),
            (price_range, "priceRange")
        )
    };
}

impl ProfileFields {
    /// Overlay a proposed partial field set onto this snapshot. Proposed
    /// slots win; unspecified slots fall through to the current values.
    pub fn overlay(&self, proposed: &ProfileFields) -> ProfileFields {
        macro_rules! merge {
            ($(($field:ident, $key:literal)),*) => {
                ProfileFields {
                    $($field: proposed.$field.clone().or_else(|| self.$field.clone()),)*
                }
            };
        }
        for_each_field!(merge)
    }

    /// Field keys whose values differ between the two snapshots.
    pub fn changed_fields(&self, other: &ProfileFields) -> Vec<&'static str> {
        let mut changed = Vec::new();
        macro_rules! compare {
            ($(($field:ident, $key:literal)),*) => {
                $(if self.$field != other.$field { changed.push($key); })*
            };
        }
        for_each_field!(compare);
        changed
    }

    /// Build the `$set` payload covering exactly the populated slots.
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        macro_rules! insert {
            ($(($field:ident, $key:literal)),*) => {
                $(if let Some(value) = &self.$field {
                    set.insert($key, Bson::from(value.clone()));
                })*
            };
        }
        for_each_field!(insert);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.to_set_document().is_empty()
    }

    /// Validate only the supplied slots. Unspecified fields are never
    /// an error at submission time.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ApiError::ValidationError("Restaurant name cannot be empty".to_string()));
            }
        }
        if let Some(phone) = &self.phone {
            if !is_valid_phone(phone) {
                return Err(ApiError::ValidationError(format!("Malformed phone number: {}", phone)));
            }
        }
        if let Some(pan) = &self.pan_number {
            if pan.trim().is_empty() {
                return Err(ApiError::ValidationError("PAN number cannot be empty".to_string()));
            }
        }
        if let Some(price_range) = &self.price_range {
            if !matches!(price_range.as_str(), "$" | "$$" | "$$$" | "$$$$") {
                return Err(ApiError::ValidationError(format!("Invalid price range: {}", price_range)));
            }
        }
        for (key, value) in [
            ("deliveryRadius", self.delivery_radius),
            ("minimumOrder", self.minimum_order),
            ("deliveryFee", self.delivery_fee),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ApiError::ValidationError(format!("{} must be a non-negative number", key)));
                }
            }
        }
        Ok(())
    }
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> ProfileFields {
        ProfileFields {
            name: Some("Momo Palace".to_string()),
            description: Some("Dumplings and more".to_string()),
            address: Some("12 Thamel Marg".to_string()),
            phone: Some("9801234567".to_string()),
            email: Some("owner@momopalace.example".to_string()),
            cuisine: Some(vec!["nepali".to_string(), "tibetan".to_string()]),
            opening_hours: Some("10:00-22:00".to_string()),
            is_open: Some(true),
            delivery_radius: Some(5.0),
            minimum_order: Some(10.0),
            delivery_fee: Some(2.0),
            logo: Some("/uploads/logo.png".to_string()),
            cover_image: Some("/uploads/cover.png".to_string()),
            pan_number: Some("601234567".to_string()),
            price_range: Some("$$".to_string()),
        }
    }

    #[test]
    fn test_overlay_keeps_unspecified_fields() {
        let proposed = ProfileFields {
            delivery_fee: Some(3.5),
            ..Default::default()
        };
        let requested = current().overlay(&proposed);

        assert_eq!(requested.delivery_fee, Some(3.5));
        assert_eq!(requested.name, current().name);
        assert_eq!(requested.delivery_radius, Some(5.0));
        assert_eq!(current().changed_fields(&requested), vec!["deliveryFee"]);
    }

    #[test]
    fn test_empty_proposal_is_noop_diff() {
        let requested = current().overlay(&ProfileFields::default());
        assert_eq!(requested, current());
        assert!(current().changed_fields(&requested).is_empty());
    }

    #[test]
    fn test_set_document_covers_exactly_populated_slots() {
        let sparse = ProfileFields {
            name: Some("New Name".to_string()),
            is_open: Some(false),
            ..Default::default()
        };
        let set = sparse.to_set_document();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("name").unwrap(), "New Name");
        assert!(!set.get_bool("isOpen").unwrap());

        // Full snapshot covers every tracked field
        assert_eq!(current().to_set_document().len(), 15);
        assert!(ProfileFields::default().is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(current().validate().is_ok());
        assert!(ProfileFields::default().validate().is_ok());

        let bad_phone = ProfileFields { phone: Some("12ab".to_string()), ..Default::default() };
        assert!(bad_phone.validate().is_err());
        let ok_phone = ProfileFields { phone: Some("+9779801234567".to_string()), ..Default::default() };
        assert!(ok_phone.validate().is_ok());

        let bad_fee = ProfileFields { delivery_fee: Some(-1.0), ..Default::default() };
        assert!(bad_fee.validate().is_err());
        let bad_range = ProfileFields { price_range: Some("cheap".to_string()), ..Default::default() };
        assert!(bad_range.validate().is_err());
        let bad_pan = ProfileFields { pan_number: Some("  ".to_string()), ..Default::default() };
        assert!(bad_pan.validate().is_err());
    }

    #[test]
    fn test_serde_uses_camel_case_keys() {
        let json = serde_json::to_value(ProfileFields {
            delivery_fee: Some(3.5),
            is_open: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["deliveryFee"], 3.5);
        assert_eq!(json["isOpen"], true);
        assert!(json.get("name").is_none());
    }
}
