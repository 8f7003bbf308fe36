use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::auth::AuthUser;
use crate::models::ApiError;
use crate::services::NotificationService;

fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw)
        .map_err(|e| ApiError::ValidationError(format!("Invalid notification ID format: {}", e)))
}

pub async fn list_notifications(
    auth: AuthUser,
    notification_service: web::Data<NotificationService>,
) -> Result<HttpResponse, ApiError> {
    let notifications = notification_service.list(&auth).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn unread_count(
    auth: AuthUser,
    notification_service: web::Data<NotificationService>,
) -> Result<HttpResponse, ApiError> {
    let count = notification_service.unread_count(&auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "unreadCount": count })))
}

pub async fn mark_read(
    auth: AuthUser,
    notification_service: web::Data<NotificationService>,
    notification_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(notification_id.as_ref())?;
    notification_service.mark_read(&id, &auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub async fn mark_all_read(
    auth: AuthUser,
    notification_service: web::Data<NotificationService>,
) -> Result<HttpResponse, ApiError> {
    let modified = notification_service.mark_all_read(&auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "modified": modified })))
}

pub async fn delete_notification(
    auth: AuthUser,
    notification_service: web::Data<NotificationService>,
    notification_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(notification_id.as_ref())?;
    notification_service.delete(&id, &auth).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
