use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::auth::AuthUser;
use crate::models::{ApiError, ProfileFields};
use crate::services::ApprovalService;

/// Current profile for the owner's restaurant, overlaid with pending
/// requested data when a change request is awaiting review.
pub async fn get_profile(
    auth: AuthUser,
    approval_service: web::Data<ApprovalService>,
) -> Result<HttpResponse, ApiError> {
    auth.require_restaurant()?;
    let profile = approval_service.profile_for_owner(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Submit a change request. Accepts any subset of the mutable profile
/// fields; unspecified fields fall through to current values.
pub async fn submit_profile_changes(
    auth: AuthUser,
    approval_service: web::Data<ApprovalService>,
    proposed: web::Json<ProfileFields>,
) -> Result<HttpResponse, ApiError> {
    auth.require_restaurant()?;
    info!("Owner {} submitting profile changes", auth.user_id);

    let approval = approval_service
        .submit_change_request(&auth.user_id, proposed.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(approval))
}

/// Pending-approval existence and details for the owner's dashboard.
pub async fn get_pending_changes(
    auth: AuthUser,
    approval_service: web::Data<ApprovalService>,
) -> Result<HttpResponse, ApiError> {
    auth.require_restaurant()?;
    let pending = approval_service.pending_changes_for_owner(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "hasPendingChanges": pending.is_some(),
        "approval": pending,
    })))
}
