//! In-app notification endpoints

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::auth::AuthenticatedUser;
use crate::api::error::ApiError;
use crate::model::notification::Notification;
use crate::service::notification::MAX_PER_USER;
use crate::service::NotificationStore;

/// Query parameters for the notification listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListNotificationsParams {
    /// Only return unread notifications (default: false)
    pub unread_only: Option<bool>,
}

/// One notification as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind.as_str().to_string(),
            icon: notification.kind.icon().to_string(),
            title: notification.kind.title().to_string(),
            message: notification.message,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub status: String,
    pub marked_read: usize,
}

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/v1/notifications",
    params(ListNotificationsParams),
    responses(
        (status = 200, description = "Notifications retrieved", body = NotificationListResponse),
        (status = 401, description = "Invalid authentication credentials")
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[get("/v1/notifications")]
pub async fn list_notifications(
    store: web::Data<NotificationStore>,
    user: AuthenticatedUser,
    query: web::Query<ListNotificationsParams>,
) -> Result<impl Responder, ApiError> {
    let unread_only = query.unread_only.unwrap_or(false);
    let (notifications, unread_count) = store.list(user.0.id, unread_only, MAX_PER_USER)?;

    Ok(HttpResponse::Ok().json(NotificationListResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        unread_count,
    }))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/read",
    params(
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[post("/v1/notifications/{id}/read")]
pub async fn mark_read(
    store: web::Data<NotificationStore>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    if !store.mark_read(user.0.id, id)? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// Mark every notification as read
#[utoipa::path(
    post,
    path = "/v1/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = MarkAllReadResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[post("/v1/notifications/read-all")]
pub async fn mark_all_read(
    store: web::Data<NotificationStore>,
    user: AuthenticatedUser,
) -> Result<impl Responder, ApiError> {
    let marked_read = store.mark_all_read(user.0.id)?;
    Ok(HttpResponse::Ok().json(MarkAllReadResponse {
        status: "ok".to_string(),
        marked_read,
    }))
}

/// Delete one notification
#[utoipa::path(
    delete,
    path = "/v1/notifications/{id}",
    params(
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[delete("/v1/notifications/{id}")]
pub async fn delete_notification(
    store: web::Data<NotificationStore>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    if !store.remove(user.0.id, id)? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// Configure notification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_notifications)
        .service(mark_read)
        .service(mark_all_read)
        .service(delete_notification);
}
