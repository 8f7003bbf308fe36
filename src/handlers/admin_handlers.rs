use actix_web::{web, HttpResponse};
use log::info;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::AuthUser;
use crate::models::ApiError;
use crate::services::approval_service::Decision;
use crate::services::ApprovalService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveApprovalRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

pub async fn list_restaurant_approvals(
    auth: AuthUser,
    approval_service: web::Data<ApprovalService>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let approvals = approval_service.list_pending_approvals().await?;
    info!("Listing {} pending restaurant approvals", approvals.len());
    Ok(HttpResponse::Ok().json(approvals))
}

pub async fn resolve_restaurant_approval(
    auth: AuthUser,
    approval_service: web::Data<ApprovalService>,
    approval_id: web::Path<String>,
    body: web::Json<ResolveApprovalRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let approval_id = ObjectId::parse_str(approval_id.as_ref())
        .map_err(|e| ApiError::ValidationError(format!("Invalid approval ID format: {}", e)))?;
    let body = body.into_inner();
    let decision = Decision::from_str(&body.status)?;

    info!("Admin {} resolving approval {} as {}", auth.user_id, approval_id, body.status);
    let resolved = approval_service
        .resolve_change_request(&approval_id, &auth.user_id, decision, body.rejection_reason)
        .await?;
    Ok(HttpResponse::Ok().json(resolved))
}
