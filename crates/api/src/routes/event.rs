use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::DateTime;
use chrono::Utc;
use knowa_db::models::{
    Event, EventRole, EventStatus, Meeting, default_capacity_crew, default_capacity_participants,
};
use knowa_services::dao::event::{EventUpdate, NewEvent, NewMeeting};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::{AdminUser, CurrentUser, MaybeUser},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    pub image: Option<String>,
    pub organizer_id: Option<String>,
    pub status: EventStatus,
    pub capacity_participants: u32,
    pub capacity_crew: u32,
    pub participants_count: usize,
    pub crew_count: usize,
    pub calendar_link: Option<String>,
    pub is_online: bool,
    pub is_participant: bool,
    pub is_crew: bool,
}

fn to_response(e: Event, viewer: Option<bson::oid::ObjectId>) -> EventResponse {
    let is_participant = viewer.is_some_and(|id| e.participants.contains(&id));
    let is_crew = viewer.is_some_and(|id| e.crew.contains(&id));
    EventResponse {
        id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: e.title,
        description: e.description,
        location: e.location,
        start_time: e.start_time.try_to_rfc3339_string().unwrap_or_default(),
        end_time: e.end_time.try_to_rfc3339_string().unwrap_or_default(),
        image: e.image,
        organizer_id: e.organizer_id.map(|id| id.to_hex()),
        status: e.status,
        capacity_participants: e.capacity_participants,
        capacity_crew: e.capacity_crew,
        participants_count: e.participants.len(),
        crew_count: e.crew.len(),
        calendar_link: e.calendar_link,
        is_online: e.is_online,
        is_participant,
        is_crew,
    }
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub is_online: bool,
    pub location: String,
    pub organizer_id: Option<String>,
    pub participants: Vec<String>,
}

fn meeting_response(m: Meeting) -> MeetingResponse {
    MeetingResponse {
        id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: m.title,
        description: m.description,
        start_time: m.start_time.try_to_rfc3339_string().unwrap_or_default(),
        end_time: m.end_time.try_to_rfc3339_string().unwrap_or_default(),
        is_online: m.is_online,
        location: m.location,
        organizer_id: m.organizer_id.map(|id| id.to_hex()),
        participants: m.participants.iter().map(|id| id.to_hex()).collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: chrono::DateTime<Utc>,
    #[serde(default)]
    pub status: EventStatus,
    pub capacity_participants: Option<u32>,
    pub capacity_crew: Option<u32>,
    pub calendar_link: Option<String>,
    #[serde(default)]
    pub is_online: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: chrono::DateTime<Utc>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Staff see every event; everyone else sees upcoming published ones.
pub async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let is_staff = user.as_ref().is_some_and(|u| u.is_admin());
    let viewer = user.as_ref().and_then(|u| u.id);
    let events = state.events.list_visible(is_staff).await?;
    Ok(Json(
        events.into_iter().map(|e| to_response(e, viewer)).collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let organizer_id = admin.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let event = state
        .event_service
        .create(NewEvent {
            title: body.title,
            description: body.description,
            location: body.location,
            start_time: DateTime::from_chrono(body.start_time),
            end_time: DateTime::from_chrono(body.end_time),
            organizer_id,
            status: body.status,
            capacity_participants: body
                .capacity_participants
                .unwrap_or_else(default_capacity_participants),
            capacity_crew: body.capacity_crew.unwrap_or_else(default_capacity_crew),
            calendar_link: body.calendar_link,
            is_online: body.is_online,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(event, Some(organizer_id)))))
}

pub async fn get(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(event_id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let eid = parse_id(&event_id, "event_id")?;
    let event = state.events.base.find_by_id(eid).await?;
    Ok(Json(to_response(event, user.and_then(|u| u.id))))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<String>,
    Json(body): Json<EventUpdate>,
) -> Result<Json<EventResponse>, ApiError> {
    let eid = parse_id(&event_id, "event_id")?;
    let event = state.events.update(eid, &body).await?;
    Ok(Json(to_response(event, admin.id)))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let eid = parse_id(&event_id, "event_id")?;
    if state.events.delete(eid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Event not found".to_string()))
    }
}

async fn join(
    state: &AppState,
    user: &knowa_db::models::User,
    event_id: &str,
    role: EventRole,
) -> Result<Json<serde_json::Value>, ApiError> {
    let eid = parse_id(event_id, "event_id")?;
    let event = state.event_service.join(eid, user, role).await?;
    let status = match role {
        EventRole::Participant => "Joined as participant",
        EventRole::Crew => "Joined as crew",
    };
    Ok(Json(serde_json::json!({
        "status": status,
        "participants_count": event.participants.len(),
        "crew_count": event.crew.len(),
    })))
}

pub async fn join_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    join(&state, &user, &event_id, EventRole::Participant).await
}

pub async fn join_crew(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    join(&state, &user, &event_id, EventRole::Crew).await
}

pub async fn create_meeting(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<MeetingResponse>), ApiError> {
    let organizer_id = admin.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if body.end_time < body.start_time {
        return Err(ApiError::Validation(
            "End time must not be before start time".to_string(),
        ));
    }
    let participants = body
        .participants
        .iter()
        .map(|id| parse_id(id, "participant id"))
        .collect::<Result<Vec<_>, _>>()?;

    let meeting = state
        .events
        .create_meeting(NewMeeting {
            title: body.title,
            description: body.description,
            start_time: DateTime::from_chrono(body.start_time),
            end_time: DateTime::from_chrono(body.end_time),
            is_online: body.is_online,
            location: body.location,
            organizer_id,
            participants,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(meeting_response(meeting))))
}

pub async fn get_meeting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<MeetingResponse>, ApiError> {
    let mid = parse_id(&meeting_id, "meeting_id")?;
    let meeting = state.events.meetings.find_by_id(mid).await?;
    let involved = user.id.is_some_and(|id| {
        meeting.organizer_id == Some(id) || meeting.participants.contains(&id)
    });
    if !involved && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You are not part of this meeting".to_string(),
        ));
    }
    Ok(Json(meeting_response(meeting)))
}
