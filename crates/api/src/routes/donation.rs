use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use knowa_db::models::{Donation, DonationStatus, NotificationType};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::{AdminUser, CurrentUser},
    state::AppState,
    uploads::{self, FormData},
};

#[derive(Debug, Serialize)]
pub struct DonationResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub amount: f64,
    pub receipt: String,
    pub status: DonationStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: String,
}

fn to_response(d: Donation) -> DonationResponse {
    DonationResponse {
        id: d.id.map(|id| id.to_hex()).unwrap_or_default(),
        user_id: d.user_id.map(|id| id.to_hex()),
        amount: d.amount,
        receipt: d.receipt,
        status: d.status,
        rejection_reason: d.rejection_reason,
        submitted_at: d.submitted_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectDonationRequest {
    pub reason: Option<String>,
}

fn parse_amount(raw: Option<String>) -> Result<f64, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("Missing 'amount' field".to_string()))?;
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Amount must be a number".to_string()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation("Amount must be positive".to_string()));
    }
    Ok(amount)
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let amount = parse_amount(form.text("amount"))?;
    let file = form
        .file("receipt")
        .ok_or_else(|| ApiError::BadRequest("Missing 'receipt' file".to_string()))?;
    let receipt = uploads::store(&state.settings.app.upload_dir, "receipts", user_id, file).await?;

    let donation = match state.donations.create(Some(user_id), amount, receipt.clone()).await {
        Ok(donation) => donation,
        Err(e) => {
            uploads::discard(&state.settings.app.upload_dir, &[receipt]).await;
            return Err(e.into());
        }
    };
    state
        .notifier
        .notify_all_admins(
            "New Donation Received",
            &format!(
                "{} submitted a donation of RM {:.2} for review.",
                user.full_name(),
                amount
            ),
            NotificationType::Info,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(donation))))
}

pub async fn mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DonationResponse>>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let donations = state.donations.for_user(user_id).await?;
    Ok(Json(donations.into_iter().map(to_response).collect()))
}

pub async fn goal(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let current_total = state.donations.total_approved().await?;
    Ok(Json(serde_json::json!({
        "goal": state.settings.donations.goal,
        "current_total": current_total,
    })))
}

/// Puts a rejected donation back in the review queue with a new receipt.
pub async fn resubmit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Json<DonationResponse>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let file = form
        .file("receipt")
        .ok_or_else(|| ApiError::BadRequest("Missing 'receipt' file".to_string()))?;
    let receipt = uploads::store(&state.settings.app.upload_dir, "receipts", user_id, file).await?;

    let donation = match state.donations.resubmit_latest(user_id, receipt.clone()).await {
        Ok(donation) => donation,
        Err(e) => {
            uploads::discard(&state.settings.app.upload_dir, &[receipt]).await;
            return Err(e.into());
        }
    };
    state
        .notifier
        .notify_all_admins(
            "Donation Receipt Resubmitted",
            &format!("{} uploaded a new donation receipt.", user.full_name()),
            NotificationType::Info,
        )
        .await?;
    Ok(Json(to_response(donation)))
}

pub async fn list_pending(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<DonationResponse>>, ApiError> {
    let donations = state.donations.pending().await?;
    Ok(Json(donations.into_iter().map(to_response).collect()))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(donation_id): Path<String>,
) -> Result<Json<DonationResponse>, ApiError> {
    let did = parse_id(&donation_id, "donation_id")?;
    let donation = state
        .donations
        .decide(did, DonationStatus::Approved, None)
        .await?;
    if let Some(donor) = donation.user_id {
        state
            .notifier
            .send(
                donor,
                "Donation Approved",
                &format!(
                    "Thank you! Your donation of RM {:.2} has been approved.",
                    donation.amount
                ),
                NotificationType::Success,
            )
            .await?;
    }
    Ok(Json(to_response(donation)))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(donation_id): Path<String>,
    body: Option<Json<RejectDonationRequest>>,
) -> Result<Json<DonationResponse>, ApiError> {
    let did = parse_id(&donation_id, "donation_id")?;
    let Json(body) = body.unwrap_or_default();
    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let donation = state
        .donations
        .decide(did, DonationStatus::Rejected, reason)
        .await?;
    if let Some(donor) = donation.user_id {
        let message = match reason {
            Some(r) => format!("Your donation receipt was rejected: {}", r),
            None => "Your donation receipt was rejected. Please upload a new receipt.".to_string(),
        };
        state
            .notifier
            .send(donor, "Donation Rejected", &message, NotificationType::Error)
            .await?;
    }
    Ok(Json(to_response(donation)))
}
