use axum::{Json, extract::State, http::StatusCode};
use knowa_db::models::{Faq, FaqAudience};
use knowa_services::chatbot::build_prompt;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::auth::{AdminUser, MaybeUser},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub target_role: FaqAudience,
    pub order: i32,
}

fn to_response(f: Faq) -> FaqResponse {
    FaqResponse {
        id: f.id.map(|id| id.to_hex()).unwrap_or_default(),
        question: f.question,
        answer: f.answer,
        target_role: f.target_role,
        order: f.order,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub target_role: FaqAudience,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: Option<String>,
}

/// Guests and members see `all` + `participant`; staff see `all` + `organizer`.
pub async fn list_faqs(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<FaqResponse>>, ApiError> {
    let is_staff = user.as_ref().is_some_and(|u| u.is_admin());
    let faqs = state
        .faqs
        .for_audiences(&FaqAudience::visible_to(is_staff))
        .await?;
    Ok(Json(faqs.into_iter().map(to_response).collect()))
}

pub async fn create_faq(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateFaqRequest>,
) -> Result<(StatusCode, Json<FaqResponse>), ApiError> {
    if body.question.trim().is_empty() || body.answer.trim().is_empty() {
        return Err(ApiError::Validation(
            "Question and answer are required".to_string(),
        ));
    }
    let faq = state
        .faqs
        .create(body.question, body.answer, body.target_role, body.order)
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(faq))))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let question = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No message provided".to_string()))?;

    let faqs = state.faqs.all().await?;
    let upcoming = state.events.upcoming_published(3).await?;
    let prompt = build_prompt(question, &faqs, &upcoming);

    let reply = state.chatbot.ask(prompt).await?;
    Ok(Json(serde_json::json!({ "reply": reply })))
}
