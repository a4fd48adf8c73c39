use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use knowa_db::models::{Message, RoomType, User};
use knowa_services::chat::{RoomContext, RoomSummary};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::{AdminUser, CurrentUser},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub name: String,
    pub description: Option<String>,
    pub event_id: Option<String>,
    pub interview_id: Option<String>,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<u64>,
}

fn room_response(ctx: RoomContext) -> RoomResponse {
    let name = ctx.display_name();
    let room = ctx.room;
    RoomResponse {
        id: room.id.map(|id| id.to_hex()).unwrap_or_default(),
        room_type: room.room_type,
        name,
        description: room.description,
        event_id: room.event_id.map(|id| id.to_hex()),
        interview_id: room.interview_id.map(|id| id.to_hex()),
        participants: room.participants.iter().map(|id| id.to_hex()).collect(),
        last_message: None,
        unread: None,
    }
}

fn summary_response(summary: RoomSummary) -> RoomResponse {
    RoomResponse {
        last_message: Some(summary.last_message),
        unread: Some(summary.unread),
        ..room_response(summary.context)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: String,
    pub is_read: bool,
    pub is_pinned: bool,
}

fn message_response(m: Message, sender_name: String) -> MessageResponse {
    MessageResponse {
        id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
        room_id: m.room_id.to_hex(),
        sender_id: m.sender_id.to_hex(),
        sender_name,
        content: m.content,
        timestamp: m.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        is_read: m.is_read,
        is_pinned: m.is_pinned,
    }
}

/// Resolves sender names with one lookup per page of messages.
async fn with_senders(
    state: &AppState,
    messages: Vec<Message>,
) -> Result<Vec<MessageResponse>, ApiError> {
    let mut sender_ids: Vec<ObjectId> = messages.iter().map(|m| m.sender_id).collect();
    sender_ids.sort();
    sender_ids.dedup();
    let names: HashMap<ObjectId, String> = state
        .users
        .find_many_by_ids(&sender_ids)
        .await?
        .into_iter()
        .filter_map(|u| u.id.map(|id| (id, u.display_name())))
        .collect();

    Ok(messages
        .into_iter()
        .map(|m| {
            let name = names.get(&m.sender_id).cloned().unwrap_or_default();
            message_response(m, name)
        })
        .collect())
}

#[derive(Debug, Serialize)]
pub struct ReaderResponse {
    pub id: String,
    pub name: String,
    pub username: String,
}

fn reader_response(u: User) -> ReaderResponse {
    ReaderResponse {
        id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: u.full_name(),
        username: u.username,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn list_rooms(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let rooms = state.chat.rooms_for(&user).await?;
    Ok(Json(rooms.into_iter().map(summary_response).collect()))
}

pub async fn get_room(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, ApiError> {
    let rid = parse_id(&room_id, "room_id")?;
    let ctx = state.chat.accessible(rid, &user).await?;
    Ok(Json(room_response(ctx)))
}

pub async fn create_room(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("Room name is required".to_string()));
    }
    let participants = body
        .participants
        .iter()
        .map(|id| parse_id(id, "participant id"))
        .collect::<Result<Vec<_>, _>>()?;
    let room = state
        .chat
        .create_room(&admin, body.name.trim(), body.description, participants)
        .await?;
    let ctx = RoomContext { room, event: None };
    Ok((StatusCode::CREATED, Json(room_response(ctx))))
}

pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let rid = parse_id(&room_id, "room_id")?;
    let messages = state.chat.list_messages(rid, &user).await?;
    Ok(Json(with_senders(&state, messages).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let rid = parse_id(&room_id, "room_id")?;
    let message = state.chat.send_message(rid, &user, &body.content).await?;
    Ok((
        StatusCode::CREATED,
        Json(message_response(message, user.display_name())),
    ))
}

pub async fn pinned(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let rid = parse_id(&room_id, "room_id")?;
    let messages = state.chat.pinned(rid, &user).await?;
    Ok(Json(with_senders(&state, messages).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&room_id, "room_id")?;
    let updated = state.chat.mark_room_read(rid, &user).await?;
    Ok(Json(serde_json::json!({
        "status": "Messages marked as read",
        "updated": updated,
    })))
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_id(&message_id, "message_id")?;
    let message = state.chat.toggle_pin(mid, &user).await?;
    let status = if message.is_pinned { "pinned" } else { "unpinned" };
    Ok(Json(serde_json::json!({
        "status": status,
        "is_pinned": message.is_pinned,
    })))
}

/// Read receipts, visible to the sender only.
pub async fn message_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_id(&message_id, "message_id")?;
    let info = state.chat.message_info(mid, &user).await?;
    let read_by: Vec<ReaderResponse> = info.read_by.into_iter().map(reader_response).collect();
    let delivered_to: Vec<ReaderResponse> =
        info.delivered_to.into_iter().map(reader_response).collect();

    Ok(Json(serde_json::json!({
        "message": info.message.content,
        "timestamp": info.message.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        "read_by": read_by,
        "delivered_to": delivered_to,
    })))
}
