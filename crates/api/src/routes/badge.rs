use axum::{Json, extract::State, http::StatusCode};
use knowa_db::models::{Badge, BadgeCriteria};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AdminUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct BadgeResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub criteria_type: BadgeCriteria,
    pub threshold: u32,
}

pub fn to_response(b: Badge) -> BadgeResponse {
    BadgeResponse {
        id: b.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: b.name,
        description: b.description,
        icon: b.icon,
        criteria_type: b.criteria_type,
        threshold: b.threshold,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBadgeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    pub criteria_type: BadgeCriteria,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

fn default_threshold() -> u32 {
    1
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<BadgeResponse>>, ApiError> {
    let badges = state.badges.list().await?;
    Ok(Json(badges.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateBadgeRequest>,
) -> Result<(StatusCode, Json<BadgeResponse>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("Badge name is required".to_string()));
    }
    let badge = state
        .badges
        .create(
            body.name,
            body.description,
            body.icon,
            body.criteria_type,
            body.threshold,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(badge))))
}
