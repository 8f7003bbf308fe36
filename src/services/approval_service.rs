use std::sync::Arc;

use log::{error, info, warn};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::UNKNOWN_TRANSACTION_COMMIT_RESULT;
use mongodb::ClientSession;
use serde::Serialize;

use crate::models::{
    ApiError, ApprovalStatus, Notification, NotificationType, ProfileFields, Recipient,
    Restaurant, RestaurantApproval, RestaurantStatus,
};
use crate::services::MongoDBService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl std::str::FromStr for Decision {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Decision::Approve),
            "rejected" => Ok(Decision::Reject),
            other => Err(ApiError::ValidationError(format!(
                "Decision must be 'approved' or 'rejected', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfileResponse {
    pub restaurant_id: String,
    pub status: RestaurantStatus,
    pub profile: ProfileFields,
    pub has_pending_changes: bool,
}

pub struct ApprovalService {
    mongodb_service: Arc<MongoDBService>,
}

impl ApprovalService {
    pub fn new(mongodb_service: Arc<MongoDBService>) -> Self {
        Self { mongodb_service }
    }

    /// Record a profile change request for the caller's restaurant.
    ///
    /// The approval insert, the restaurant status flip and the admin
    /// notification commit or roll back together; the partial unique index
    /// on pending approvals makes the duplicate check race-free.
    pub async fn submit_change_request(
        &self,
        owner_user_id: &ObjectId,
        proposed: ProfileFields,
    ) -> Result<RestaurantApproval, ApiError> {
        let restaurant = self
            .mongodb_service
            .get_restaurant_by_owner(owner_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No restaurant found for this account".to_string()))?;
        let restaurant_id = restaurant
            .id
            .ok_or_else(|| ApiError::InternalError("Restaurant document has no id".to_string()))?;

        if self
            .mongodb_service
            .find_pending_approval(&restaurant_id)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "You already have pending changes awaiting review".to_string(),
            ));
        }

        proposed.validate()?;

        let owner = self
            .mongodb_service
            .get_user_by_id(owner_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Owner account not found".to_string()))?;

        let current_data = restaurant.profile_snapshot(&owner);
        let requested_data = current_data.overlay(&proposed);
        let mut approval = RestaurantApproval::new(
            restaurant_id,
            current_data,
            requested_data,
            restaurant.status,
        );

        let mut session = self.mongodb_service.start_session().await?;
        session
            .start_transaction(None)
            .await
            .map_err(ApiError::DatabaseError)?;

        let result = self
            .submit_in_transaction(&approval, &restaurant, &mut session)
            .await;
        let approval_id = match result {
            Ok(id) => id,
            Err(e) => {
                abort_quietly(&mut session).await;
                return Err(e);
            }
        };
        commit_with_retry(&mut session).await?;

        approval.id = Some(approval_id);
        info!(
            "Recorded change request {} for restaurant {} ({} field(s) changed)",
            approval_id,
            restaurant_id,
            approval.changed_fields().len()
        );
        Ok(approval)
    }

    async fn submit_in_transaction(
        &self,
        approval: &RestaurantApproval,
        restaurant: &Restaurant,
        session: &mut ClientSession,
    ) -> Result<ObjectId, ApiError> {
        let restaurant_id = approval.restaurant_id;
        let approval_id = self
            .mongodb_service
            .insert_approval_with_session(approval, session)
            .await?;
        self.mongodb_service
            .set_restaurant_status_with_session(&restaurant_id, RestaurantStatus::PendingApproval, session)
            .await?;

        let notification = admin_notification(approval, &approval_id, &restaurant.name);
        self.mongodb_service
            .insert_notification_with_session(&notification, session)
            .await?;
        Ok(approval_id)
    }

    /// Approve or reject a pending change request. The terminal transition is
    /// a compare-and-swap on `status: pending`, so a second resolver gets
    /// CONFLICT instead of double-applying.
    pub async fn resolve_change_request(
        &self,
        approval_id: &ObjectId,
        admin_user_id: &ObjectId,
        decision: Decision,
        rejection_reason: Option<String>,
    ) -> Result<RestaurantApproval, ApiError> {
        let reason = match decision {
            Decision::Reject => Some(require_reason(rejection_reason)?),
            Decision::Approve => None,
        };

        let approval = self
            .mongodb_service
            .get_approval_by_id(approval_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Approval {} not found", approval_id)))?;
        if !approval.is_pending() {
            return Err(ApiError::Conflict(format!(
                "Approval {} has already been {}",
                approval_id, approval.status
            )));
        }

        let restaurant = self
            .mongodb_service
            .get_restaurant_by_id(&approval.restaurant_id)
            .await?
            .ok_or_else(|| {
                error!("Approval {} references missing restaurant {}", approval_id, approval.restaurant_id);
                ApiError::NotFound("Restaurant for this approval no longer exists".to_string())
            })?;

        let mut session = self.mongodb_service.start_session().await?;
        session
            .start_transaction(None)
            .await
            .map_err(ApiError::DatabaseError)?;

        let result = self
            .resolve_in_transaction(&approval, &restaurant, admin_user_id, decision, reason.as_deref(), &mut session)
            .await;
        let resolved = match result {
            Ok(resolved) => resolved,
            Err(e) => {
                abort_quietly(&mut session).await;
                return Err(e);
            }
        };
        commit_with_retry(&mut session).await?;

        info!(
            "Approval {} for restaurant {} resolved as {}",
            approval_id, approval.restaurant_id, resolved.status
        );
        Ok(resolved)
    }

    async fn resolve_in_transaction(
        &self,
        approval: &RestaurantApproval,
        restaurant: &Restaurant,
        admin_user_id: &ObjectId,
        decision: Decision,
        reason: Option<&str>,
        session: &mut ClientSession,
    ) -> Result<RestaurantApproval, ApiError> {
        let approval_id = approval
            .id
            .ok_or_else(|| ApiError::InternalError("Approval document has no id".to_string()))?;
        let target_status = match decision {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        };

        let resolved = self
            .mongodb_service
            .resolve_approval_with_session(&approval_id, target_status, admin_user_id, reason, session)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict(format!("Approval {} has already been processed", approval_id))
            })?;

        match decision {
            Decision::Approve => {
                // Copy every requested field onto the live restaurant
                let mut set = approval.requested_data.to_set_document();
                set.insert("status", RestaurantStatus::Approved.to_string());
                self.mongodb_service
                    .update_restaurant_with_session(&approval.restaurant_id, set, session)
                    .await?;
            }
            Decision::Reject => {
                // Business fields untouched; status reverts to its
                // pre-submission value
                self.mongodb_service
                    .set_restaurant_status_with_session(&approval.restaurant_id, approval.previous_status, session)
                    .await?;
            }
        }

        let notification = owner_notification(&resolved, &restaurant.owner_id, &restaurant.name);
        self.mongodb_service
            .insert_notification_with_session(&notification, session)
            .await?;

        Ok(resolved)
    }

    /// The single pending approval (if any) for the caller's restaurant.
    pub async fn pending_changes_for_owner(
        &self,
        owner_user_id: &ObjectId,
    ) -> Result<Option<RestaurantApproval>, ApiError> {
        let restaurant = self
            .mongodb_service
            .get_restaurant_by_owner(owner_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No restaurant found for this account".to_string()))?;
        let restaurant_id = restaurant
            .id
            .ok_or_else(|| ApiError::InternalError("Restaurant document has no id".to_string()))?;
        self.mongodb_service.find_pending_approval(&restaurant_id).await
    }

    /// Live profile, overlaid with the pending requested data when present.
    pub async fn profile_for_owner(
        &self,
        owner_user_id: &ObjectId,
    ) -> Result<OwnerProfileResponse, ApiError> {
        let restaurant = self
            .mongodb_service
            .get_restaurant_by_owner(owner_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No restaurant found for this account".to_string()))?;
        let restaurant_id = restaurant
            .id
            .ok_or_else(|| ApiError::InternalError("Restaurant document has no id".to_string()))?;
        let owner = self
            .mongodb_service
            .get_user_by_id(owner_user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Owner account not found".to_string()))?;

        let pending = self.mongodb_service.find_pending_approval(&restaurant_id).await?;
        let has_pending_changes = pending.is_some();
        let profile = match pending {
            Some(approval) => approval.requested_data,
            None => restaurant.profile_snapshot(&owner),
        };

        Ok(OwnerProfileResponse {
            restaurant_id: restaurant_id.to_hex(),
            status: restaurant.status,
            profile,
            has_pending_changes,
        })
    }

    pub async fn list_pending_approvals(&self) -> Result<Vec<RestaurantApproval>, ApiError> {
        self.mongodb_service.list_pending_approvals().await
    }
}

fn require_reason(rejection_reason: Option<String>) -> Result<String, ApiError> {
    match rejection_reason {
        Some(reason) if !reason.trim().is_empty() => Ok(reason),
        _ => Err(ApiError::ValidationError(
            "A rejection reason is required".to_string(),
        )),
    }
}

fn admin_notification(
    approval: &RestaurantApproval,
    approval_id: &ObjectId,
    restaurant_name: &str,
) -> Notification {
    let changed = approval.changed_fields();
    let message = if changed.is_empty() {
        format!("{} resubmitted its profile with no field changes", restaurant_name)
    } else {
        format!(
            "{} requested changes to: {}",
            restaurant_name,
            changed.join(", ")
        )
    };
    Notification::new(
        Recipient::Admins,
        NotificationType::ProfileChangeRequested,
        "Restaurant profile change requested".to_string(),
        message,
        Some(doc! {
            "approvalId": approval_id,
            "restaurantId": approval.restaurant_id,
        }),
    )
}

fn owner_notification(
    resolved: &RestaurantApproval,
    owner_id: &ObjectId,
    restaurant_name: &str,
) -> Notification {
    let data = doc! {
        "approvalId": resolved.id,
        "restaurantId": resolved.restaurant_id,
    };
    match resolved.status {
        ApprovalStatus::Rejected => Notification::new(
            Recipient::User(*owner_id),
            NotificationType::ProfileChangeRejected,
            "Profile changes rejected".to_string(),
            format!(
                "Your changes to {} were rejected: {}",
                restaurant_name,
                resolved.rejection_reason.as_deref().unwrap_or("no reason given")
            ),
            Some(data),
        ),
        _ => Notification::new(
            Recipient::User(*owner_id),
            NotificationType::ProfileChangeApproved,
            "Profile changes approved".to_string(),
            format!("Your changes to {} have been approved", restaurant_name),
            Some(data),
        ),
    }
}

async fn abort_quietly(session: &mut ClientSession) {
    if let Err(e) = session.abort_transaction().await {
        warn!("Failed to abort transaction: {}", e);
    }
}

async fn commit_with_retry(session: &mut ClientSession) -> Result<(), ApiError> {
    loop {
        match session.commit_transaction().await {
            Ok(()) => return Ok(()),
            Err(e) if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) => {
                warn!("Commit result unknown, retrying: {}", e);
            }
            Err(e) => return Err(ApiError::DatabaseError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileFields;
    use std::str::FromStr;

    fn pending_approval(changed_fee: Option<f64>) -> RestaurantApproval {
        let current = ProfileFields {
            name: Some("Momo Palace".to_string()),
            delivery_fee: Some(2.0),
            ..Default::default()
        };
        let proposed = ProfileFields {
            delivery_fee: changed_fee,
            ..Default::default()
        };
        let requested = current.overlay(&proposed);
        RestaurantApproval::new(ObjectId::new(), current, requested, RestaurantStatus::Approved)
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!(Decision::from_str("approved").unwrap(), Decision::Approve);
        assert_eq!(Decision::from_str("rejected").unwrap(), Decision::Reject);
        assert!(Decision::from_str("maybe").is_err());
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(require_reason(None).is_err());
        assert!(require_reason(Some("   ".to_string())).is_err());
        assert_eq!(require_reason(Some("PAN number invalid".to_string())).unwrap(), "PAN number invalid");
    }

    #[test]
    fn test_admin_notification_carries_approval_id() {
        let approval = pending_approval(Some(3.5));
        let approval_id = ObjectId::new();
        let n = admin_notification(&approval, &approval_id, "Momo Palace");
        assert!(n.is_admin_notification);
        let data = n.data.unwrap();
        assert_eq!(data.get_object_id("approvalId").unwrap(), approval_id);
        assert_eq!(data.get_object_id("restaurantId").unwrap(), approval.restaurant_id);
        assert!(n.message.contains("deliveryFee"));
    }

    #[test]
    fn test_noop_submission_message() {
        let approval = pending_approval(None);
        let n = admin_notification(&approval, &ObjectId::new(), "Momo Palace");
        assert!(n.message.contains("no field changes"));
    }

    #[test]
    fn test_rejection_notification_contains_reason() {
        let mut approval = pending_approval(Some(3.5));
        approval.id = Some(ObjectId::new());
        approval.status = ApprovalStatus::Rejected;
        approval.rejection_reason = Some("PAN number invalid".to_string());
        let owner_id = ObjectId::new();
        let n = owner_notification(&approval, &owner_id, "Momo Palace");
        assert_eq!(n.user_id, Some(owner_id));
        assert_eq!(n.notification_type, NotificationType::ProfileChangeRejected);
        assert!(n.message.contains("PAN number invalid"));
    }
}
