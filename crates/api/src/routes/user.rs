use axum::{
    Json,
    extract::{Path, State},
};
use bson::DateTime;
use chrono::{Datelike, TimeZone, Utc};
use knowa_db::models::{Interview, MemberStatus, User, UserProfile};
use knowa_services::dao::user::ProfileUpdate;
use knowa_services::membership::InterviewOutcome;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::{AdminUser, CurrentUser},
    state::AppState,
    uploads::{self, FormData},
};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub interests: String,
    pub member_status: MemberStatus,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: String,
}

pub fn to_response(u: &User) -> UserResponse {
    UserResponse {
        id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
        username: u.username.clone(),
        email: u.email.clone(),
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        phone: u.phone.clone(),
        interests: u.interests.clone(),
        member_status: u.member_status,
        is_staff: u.is_staff,
        is_superuser: u.is_superuser,
        date_joined: u.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub full_name: Option<String>,
    pub ic_number: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub education: Option<String>,
    pub motivation: Option<String>,
    pub resume: Option<String>,
    pub identification: Option<String>,
    pub payment_receipt: Option<String>,
    pub rejection_reason: Option<String>,
    pub application_date: Option<String>,
}

pub fn profile_response(p: UserProfile) -> ProfileResponse {
    ProfileResponse {
        full_name: p.full_name,
        ic_number: p.ic_number,
        occupation: p.occupation,
        address: p.address,
        education: p.education,
        motivation: p.motivation,
        resume: p.resume,
        identification: p.identification,
        payment_receipt: p.payment_receipt,
        rejection_reason: p.rejection_reason,
        application_date: p
            .application_date
            .and_then(|d| d.try_to_rfc3339_string().ok()),
    }
}

#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: ProfileResponse,
}

async fn with_profile(state: &AppState, user: &User) -> Result<AdminUserResponse, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let profile = state.users.profile(user_id).await?;
    Ok(AdminUserResponse {
        user: to_response(user),
        profile: profile_response(profile),
    })
}

async fn with_profiles(state: &AppState, users: Vec<User>) -> Result<Vec<AdminUserResponse>, ApiError> {
    let mut items = Vec::with_capacity(users.len());
    for user in &users {
        items.push(with_profile(state, user).await?);
    }
    Ok(items)
}

#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    pub id: String,
    pub applicant_id: String,
    pub applicant_name: String,
    pub scheduler_id: Option<String>,
    pub interviewer_id: Option<String>,
    pub date_time: String,
    pub location: Option<String>,
    pub meeting_link: String,
    pub status: knowa_db::models::InterviewStatus,
    pub report: Option<String>,
}

fn interview_response(i: Interview, applicant_name: String) -> InterviewResponse {
    InterviewResponse {
        id: i.id.map(|id| id.to_hex()).unwrap_or_default(),
        applicant_id: i.applicant_id.to_hex(),
        applicant_name,
        scheduler_id: i.scheduler_id.map(|id| id.to_hex()),
        interviewer_id: i.interviewer_id.map(|id| id.to_hex()),
        date_time: i.date_time.try_to_rfc3339_string().unwrap_or_default(),
        location: i.location,
        meeting_link: i.meeting_link,
        status: i.status,
        report: i.report,
    }
}

const DOCUMENT_FIELDS: [&str; 2] = ["resume", "identification"];

/// Submit or update the membership application.
pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;

    let mut update = ProfileUpdate {
        full_name: form.text("full_name"),
        ic_number: form.text("ic_number"),
        occupation: form.text("occupation"),
        address: form.text("address"),
        education: form.text("education"),
        motivation: form.text("motivation"),
        ..Default::default()
    };
    let upload_dir = &state.settings.app.upload_dir;
    let mut stored = Vec::new();
    for field in DOCUMENT_FIELDS {
        if let Some(file) = form.file(field) {
            let key = match uploads::store(upload_dir, field, user_id, file).await {
                Ok(key) => key,
                Err(e) => {
                    uploads::discard(upload_dir, &stored).await;
                    return Err(e);
                }
            };
            stored.push(key.clone());
            match field {
                "resume" => update.resume = Some(key),
                _ => update.identification = Some(key),
            }
        }
    }

    let result = match state.membership.submit_application(user_id, &update).await {
        Ok(result) => result,
        Err(e) => {
            uploads::discard(upload_dir, &stored).await;
            return Err(e.into());
        }
    };
    let status = if result.transitioned {
        "Application submitted"
    } else {
        "Application updated"
    };

    Ok(Json(serde_json::json!({
        "status": status,
        "member_status": result.user.member_status,
        "profile": profile_response(result.profile),
    })))
}

/// Upload the membership fee receipt.
pub async fn upload_payment_receipt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    let file = form
        .file("receipt")
        .or_else(|| form.file("payment_receipt"))
        .ok_or_else(|| ApiError::BadRequest("Missing 'receipt' file".to_string()))?;

    let upload_dir = &state.settings.app.upload_dir;
    let key = uploads::store(upload_dir, "payment_receipts", user_id, file).await?;
    if let Err(e) = state
        .users
        .set_profile_field(user_id, "payment_receipt", key.as_str())
        .await
    {
        uploads::discard(upload_dir, std::slice::from_ref(&key)).await;
        return Err(e.into());
    }

    Ok(Json(serde_json::json!({
        "status": "Receipt uploaded",
        "payment_receipt": key,
    })))
}

pub async fn schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = state.accounts.schedule(&user).await?;
    Ok(Json(serde_json::json!(items)))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub subject: String,
    pub message: String,
    pub rating: Option<u8>,
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user.id.ok_or(ApiError::NotFound("User not found".to_string()))?;
    if body.subject.trim().is_empty() || body.message.trim().is_empty() {
        return Err(ApiError::Validation("Subject and message are required".to_string()));
    }
    if body.rating.is_some_and(|r| !(1..=5).contains(&r)) {
        return Err(ApiError::Validation("Rating must be between 1 and 5".to_string()));
    }
    let feedback = state
        .feedback
        .create(user_id, body.subject, body.message, body.rating)
        .await?;
    Ok(Json(serde_json::json!({
        "id": feedback.id.map(|id| id.to_hex()),
        "status": "Feedback received",
    })))
}

// ---- Admin ----

pub async fn list_pending(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminUserResponse>>, ApiError> {
    let users = state.users.list_by_status(MemberStatus::Pending).await?;
    Ok(Json(with_profiles(&state, users).await?))
}

pub async fn list_pending_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminUserResponse>>, ApiError> {
    let users = state.users.pending_payment().await?;
    Ok(Json(with_profiles(&state, users).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.users.base.find_by_id(uid).await?;
    Ok(Json(with_profile(&state, &user).await?))
}

pub async fn list_staff(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let staff: Vec<serde_json::Value> = state
        .users
        .staff()
        .await?
        .iter()
        .map(|u| {
            serde_json::json!({
                "id": u.id.map(|id| id.to_hex()),
                "name": u.display_name(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!(staff)))
}

/// Staff first, then members and volunteers who are not staff.
pub async fn list_selectable(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let staff = state.users.staff().await?;
    let staff_ids: Vec<_> = staff.iter().filter_map(|u| u.id).collect();

    let entry = |u: &User, role: &str| {
        serde_json::json!({
            "id": u.id.map(|id| id.to_hex()),
            "name": u.full_name(),
            "email": u.email,
            "role": role,
        })
    };

    let mut results: Vec<serde_json::Value> = staff.iter().map(|u| entry(u, "ADMIN")).collect();
    for (status, role) in [
        (MemberStatus::Member, "MEMBER"),
        (MemberStatus::Volunteer, "VOLUNTEER"),
    ] {
        for u in state.users.list_by_status(status).await? {
            if u.id.is_some_and(|id| !staff_ids.contains(&id)) {
                results.push(entry(&u, role));
            }
        }
    }
    Ok(Json(serde_json::json!(results)))
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    let month_start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);

    let total_members = state.users.count_members().await?;
    let pending_applications = state.users.count_status(MemberStatus::Pending).await?;
    let active_events = state.events.count_active().await?;
    let monthly_donations = state
        .donations
        .approved_since(DateTime::from_chrono(month_start))
        .await?;

    Ok(Json(serde_json::json!({
        "total_members": total_members,
        "pending_applications": pending_applications,
        "active_events": active_events,
        "monthly_donations": monthly_donations,
    })))
}

pub async fn interview_history(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InterviewResponse>>, ApiError> {
    let interviews = state.interviews.history().await?;
    let mut items = Vec::with_capacity(interviews.len());
    for interview in interviews {
        let name = state
            .users
            .base
            .find_by_id(interview.applicant_id)
            .await
            .map(|u| u.full_name())
            .unwrap_or_default();
        items.push(interview_response(interview, name));
    }
    Ok(Json(items))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items: Vec<serde_json::Value> = state
        .feedback
        .list()
        .await?
        .into_iter()
        .map(|f| {
            serde_json::json!({
                "id": f.id.map(|id| id.to_hex()),
                "user_id": f.user_id.to_hex(),
                "subject": f.subject,
                "message": f.message,
                "rating": f.rating,
                "created_at": f.created_at.try_to_rfc3339_string().unwrap_or_default(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!(items)))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub date_time: chrono::DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub interviewer_id: Option<String>,
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<ScheduleInterviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let interviewer_id = body
        .interviewer_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_id(s, "interviewer_id"))
        .transpose()?;

    let scheduled = state
        .membership
        .schedule_interview(
            &admin,
            uid,
            DateTime::from_chrono(body.date_time),
            interviewer_id,
            body.meeting_link,
        )
        .await?;

    Ok(Json(serde_json::json!({
        "status": "Interview scheduled and Chat Room created",
        "interview_id": scheduled.interview.id.map(|id| id.to_hex()),
        "chat_room_id": scheduled.room.id.map(|id| id.to_hex()),
        "member_status": scheduled.applicant.member_status,
    })))
}

pub async fn approve_member(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.membership.approve_member(uid).await?;
    Ok(Json(serde_json::json!({
        "status": "User approved, awaiting payment.",
        "member_status": user.member_status,
    })))
}

pub async fn approve_volunteer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.membership.approve_volunteer(uid).await?;
    Ok(Json(serde_json::json!({
        "status": "User approved as Volunteer.",
        "member_status": user.member_status,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject_application(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let Json(body) = body.unwrap_or_default();
    let (user, reason) = state
        .membership
        .reject_application(uid, body.reason.as_deref())
        .await?;
    Ok(Json(serde_json::json!({
        "status": "User rejected",
        "reason": reason,
        "member_status": user.member_status,
    })))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.membership.confirm_payment(uid).await?;
    Ok(Json(serde_json::json!({
        "status": "Payment confirmed.",
        "member_status": user.member_status,
    })))
}

pub async fn reject_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.membership.reject_payment(uid).await?;
    Ok(Json(serde_json::json!({
        "status": "Payment rejected.",
        "member_status": user.member_status,
    })))
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub action: String,
    pub report: Option<String>,
}

/// Pass or fail an interview. Open to staff and the interview's scheduler or interviewer.
pub async fn grade_interview(
    State(state): State<AppState>,
    CurrentUser(grader): CurrentUser,
    Path(user_id): Path<String>,
    Json(body): Json<GradeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let outcome: InterviewOutcome = body.action.parse().map_err(|_| {
        ApiError::BadRequest("Invalid action. Please send 'pass' or 'fail'.".to_string())
    })?;

    let interview = state
        .membership
        .grade_interview(&grader, uid, outcome, body.report.as_deref())
        .await?;

    let status = match outcome {
        InterviewOutcome::Pass => "User passed. Report saved.",
        InterviewOutcome::Fail => "User rejected. Report saved.",
    };
    Ok(Json(serde_json::json!({
        "status": status,
        "interview_status": interview.status,
    })))
}
