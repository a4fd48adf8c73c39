use axum::{
    Json,
    extract::{Path, State},
};
use knowa_db::models::{Notification, NotificationType};
use serde::Serialize;

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::CurrentUser,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: String,
}

fn to_response(n: Notification) -> NotificationResponse {
    NotificationResponse {
        id: n.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: n.title,
        message: n.message,
        notification_type: n.notification_type,
        is_read: n.is_read,
        created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let items = state.notifications.for_recipient(user_id).await?;
    Ok(Json(items.into_iter().map(to_response).collect()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let nid = parse_id(&notification_id, "notification_id")?;
    let notification = state.notifications.mark_read(nid, user_id).await?;
    Ok(Json(to_response(notification)))
}
