use axum::{Json, extract::State, http::StatusCode};
use bson::doc;
use knowa_db::models::ActivityCounters;
use knowa_services::accounts::TacPurpose;
use knowa_services::dao::user::NewUser;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::badge::{BadgeResponse, to_response as badge_response};
use super::user::{ProfileResponse, UserResponse, profile_response, to_response};
use crate::{
    error::ApiError,
    extractors::auth::CurrentUser,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Password fields didn't match."))]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub interests: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub username: String,
    #[serde(alias = "tac")]
    pub tac_code: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub email: String,
    #[serde(alias = "tac")]
    pub tac_code: String,
    #[serde(alias = "new_password")]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: ProfileResponse,
    pub stats: ActivityCounters,
    pub badges: Vec<BadgeResponse>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    body.validate()?;

    let new_user = NewUser {
        username: body.username.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        interests: body.interests,
        ..Default::default()
    };
    let user = state.accounts.register(new_user, &body.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Registration successful. Please login.",
            "username": user.username,
            "status": user.member_status,
        })),
    ))
}

/// First login step: checks the password and mails a one-time code.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .accounts
        .check_credentials(&body.username, &body.password)
        .await?;
    state.accounts.issue_tac(&user, TacPurpose::Login).await?;

    Ok(Json(serde_json::json!({
        "message": "A 2FA code has been sent to your email.",
    })))
}

/// Second login step: trades a valid code for a token pair.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .accounts
        .consume_tac(
            doc! { "username": body.username.as_str() },
            &body.tac_code,
            TacPurpose::Login,
        )
        .await?;
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username)?;

    Ok(Json(TokenResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        expires_in: tokens.expires_in,
        user: to_response(&user),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh)?;
    let user_id = crate::error::parse_id(&claims.sub, "token subject")
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;
    let user = state.users.base.find_by_id(user_id).await?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is disabled".to_string()));
    }
    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username)?;

    Ok(Json(serde_json::json!({
        "access": tokens.access,
        "refresh": tokens.refresh,
        "expires_in": tokens.expires_in,
    })))
}

/// Always answers the same way so the endpoint cannot be used to probe emails.
pub async fn password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = body.email.trim().to_lowercase();
    match state.users.find_by_email(&email).await {
        Ok(user) => state.accounts.issue_tac(&user, TacPurpose::PasswordReset).await?,
        Err(knowa_services::dao::base::DaoError::NotFound) => {
            tracing::debug!(%email, "Password reset requested for unknown email");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Json(serde_json::json!({ "status": "Password reset email sent." })))
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetConfirm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    state
        .accounts
        .reset_password(&body.email.trim().to_lowercase(), &body.tac_code, &body.password)
        .await?;
    Ok(Json(serde_json::json!({ "status": "Password reset successful." })))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let profile = state.users.profile(user_id).await?;
    let stats = state.accounts.counters(user_id).await?;
    let badges = state.accounts.earned_badges(&stats).await?;

    Ok(Json(MeResponse {
        user: to_response(&user),
        profile: profile_response(profile),
        stats,
        badges: badges.into_iter().map(badge_response).collect(),
    }))
}
