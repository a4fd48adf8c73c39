use crate::fixtures::test_app::TestApp;
use serde_json::Value;

fn application_form() -> Value {
    serde_json::json!({
        "full_name": "Amina Rahman",
        "ic_number": "900101-14-5678",
        "occupation": "Librarian",
        "address": "Jalan Ampang, Kuala Lumpur",
        "education": "Degree",
        "motivation": "I want to help run literacy programmes.",
    })
}

async fn apply(app: &TestApp, token: &str) -> Value {
    let resp = app
        .auth_post("/api/users/apply", token)
        .json(&application_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

async fn schedule(app: &TestApp, admin_token: &str, applicant_id: &str, interviewer_id: &str) -> Value {
    let when = chrono::Utc::now() + chrono::Duration::days(2);
    let resp = app
        .auth_post(&format!("/api/users/admin/interview/{}", applicant_id), admin_token)
        .json(&serde_json::json!({
            "date_time": when.to_rfc3339(),
            "meeting_link": "https://meet.example.org/knowa-interview",
            "interviewer_id": interviewer_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.status().as_u16(),
        200,
        "Schedule failed: {}",
        resp.text().await.unwrap_or_default()
    );
    resp.json().await.unwrap()
}

async fn notifications(app: &TestApp, token: &str) -> Vec<Value> {
    let resp = app.auth_get("/api/notifications", token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn application_moves_public_to_pending_once() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let applicant = app.seed_user("amina", "PUBLIC", false).await;

    let json = apply(&app, &applicant.access_token).await;
    assert_eq!(json["status"], "Application submitted");
    assert_eq!(json["member_status"], "PENDING");
    assert_eq!(json["profile"]["full_name"], "Amina Rahman");
    assert!(json["profile"]["application_date"].is_string());

    let admin_inbox = notifications(&app, &admin.access_token).await;
    assert!(
        admin_inbox
            .iter()
            .any(|n| n["title"] == "New Membership Application")
    );

    // A second submission only updates the profile
    let json = apply(&app, &applicant.access_token).await;
    assert_eq!(json["status"], "Application updated");
    assert_eq!(json["member_status"], "PENDING");

    let resp = app
        .auth_get("/api/users/admin/pending", &admin.access_token)
        .send()
        .await
        .unwrap();
    let pending: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["username"], "amina");
    assert_eq!(pending[0]["profile"]["occupation"], "Librarian");
}

#[tokio::test]
async fn application_accepts_multipart_documents() {
    let app = TestApp::spawn().await;
    let applicant = app.seed_user("amina", "PUBLIC", false).await;

    let form = reqwest::multipart::Form::new()
        .text("full_name", "Amina Rahman")
        .text("motivation", "Volunteering")
        .part(
            "resume",
            reqwest::multipart::Part::bytes(b"%PDF-1.4 resume".to_vec()).file_name("resume.pdf"),
        );
    let resp = app
        .auth_post("/api/users/apply", &applicant.access_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    let key = json["profile"]["resume"].as_str().unwrap().to_string();
    assert!(key.starts_with(&format!("resume/{}/", applicant.id)));
    assert!(key.ends_with("resume.pdf"));

    let resp = app
        .auth_get(&format!("/api/files/{}", key), &applicant.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.4 resume");

    let stranger = app.seed_user("stranger", "PUBLIC", false).await;
    let resp = app
        .auth_get(&format!("/api/files/{}", key), &stranger.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn interview_flow_reaches_member() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let interviewer = app.seed_user("kamal", "MEMBER", false).await;
    let applicant = app.seed_user("amina", "PUBLIC", false).await;

    apply(&app, &applicant.access_token).await;

    let json = schedule(&app, &admin.access_token, &applicant.id, &interviewer.id).await;
    assert_eq!(json["status"], "Interview scheduled and Chat Room created");
    assert_eq!(json["member_status"], "INTERVIEW");
    let room_id = json["chat_room_id"].as_str().unwrap().to_string();

    let resp = app
        .auth_get(&format!("/api/chat/rooms/{}", room_id), &applicant.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let room: Value = resp.json().await.unwrap();
    assert_eq!(room["type"], "INTERVIEW");
    assert_eq!(room["participants"].as_array().unwrap().len(), 3);
    assert_eq!(room["name"], "Interview: amina - SCHEDULED");

    // Rescheduling reuses the same room
    let again = schedule(&app, &admin.access_token, &applicant.id, &interviewer.id).await;
    assert_eq!(again["chat_room_id"], room_id.as_str());

    // The interview shows on the applicant's schedule
    let resp = app
        .auth_get("/api/users/schedule", &applicant.access_token)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "INTERVIEW");

    // A random user may not grade
    let outsider = app.seed_user("outsider", "MEMBER", false).await;
    let resp = app
        .auth_post(
            &format!("/api/users/interview/{}/grade", applicant.id),
            &outsider.access_token,
        )
        .json(&serde_json::json!({ "action": "pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // The assigned interviewer may
    let resp = app
        .auth_post(
            &format!("/api/users/interview/{}/grade", applicant.id),
            &interviewer.access_token,
        )
        .json(&serde_json::json!({ "action": "pass", "report": "Strong candidate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["interview_status"], "COMPLETED");
    assert_eq!(app.member_status(&applicant.id).await, "APPROVED_UNPAID");

    let inbox = notifications(&app, &applicant.access_token).await;
    assert!(inbox.iter().any(|n| n["title"] == "Interview Passed!"));

    let resp = app
        .auth_get("/api/users/admin/interviews/history", &admin.access_token)
        .send()
        .await
        .unwrap();
    let history: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["report"], "Strong candidate");

    let resp = app
        .auth_post(
            &format!("/api/users/admin/confirm-payment/{}", applicant.id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(app.member_status(&applicant.id).await, "MEMBER");
}

#[tokio::test]
async fn grade_rejects_unknown_action() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let applicant = app.seed_user("amina", "PENDING", false).await;

    let resp = app
        .auth_post(
            &format!("/api/users/interview/{}/grade", applicant.id),
            &admin.access_token,
        )
        .json(&serde_json::json!({ "action": "maybe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Invalid action. Please send 'pass' or 'fail'.");
    assert_eq!(app.member_status(&applicant.id).await, "PENDING");
}

#[tokio::test]
async fn reject_application_records_reason() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let applicant = app.seed_user("amina", "PUBLIC", false).await;
    apply(&app, &applicant.access_token).await;

    let resp = app
        .auth_post(
            &format!("/api/users/admin/reject/{}", applicant.id),
            &admin.access_token,
        )
        .json(&serde_json::json!({ "reason": "Incomplete documents" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "Incomplete documents");
    assert_eq!(app.member_status(&applicant.id).await, "REJECTED");

    let resp = app
        .auth_get("/api/auth/me", &applicant.access_token)
        .send()
        .await
        .unwrap();
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["profile"]["rejection_reason"], "Incomplete documents");

    let inbox = notifications(&app, &applicant.access_token).await;
    assert!(inbox.iter().any(|n| n["title"] == "Application Update"));
}

#[tokio::test]
async fn reject_without_reason_uses_default() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let applicant = app.seed_user("amina", "INTERVIEW", false).await;

    let resp = app
        .auth_post(
            &format!("/api/users/admin/reject/{}", applicant.id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "Application rejected by Admin");
}

#[tokio::test]
async fn invalid_transitions_conflict() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;

    for action in ["approve-member", "approve-volunteer", "reject", "confirm-payment", "reject-payment"] {
        let resp = app
            .auth_post(
                &format!("/api/users/admin/{}/{}", action, member.id),
                &admin.access_token,
            )
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 409, "{} should conflict", action);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "invalid_transition");
    }
    assert_eq!(app.member_status(&member.id).await, "MEMBER");

    // Unknown user is still a plain 404
    let resp = app
        .auth_post(
            &format!("/api/users/admin/approve-member/{}", bson::oid::ObjectId::new().to_hex()),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_routes_require_staff() {
    let app = TestApp::spawn().await;
    let member = app.seed_user("amina", "MEMBER", false).await;

    for path in ["/api/users/admin/pending", "/api/users/admin/stats", "/api/users/admin/staff"] {
        let resp = app.auth_get(path, &member.access_token).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 403, "{} should be staff-only", path);
    }
}

#[tokio::test]
async fn approve_volunteer_and_stats() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let applicant = app.seed_user("amina", "PENDING", false).await;
    app.seed_user("kamal", "PENDING", false).await;

    let resp = app
        .auth_post(
            &format!("/api/users/admin/approve-volunteer/{}", applicant.id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(app.member_status(&applicant.id).await, "VOLUNTEER");

    let resp = app
        .auth_get("/api/users/admin/stats", &admin.access_token)
        .send()
        .await
        .unwrap();
    let stats: Value = resp.json().await.unwrap();
    assert_eq!(stats["pending_applications"], 1);
    assert_eq!(stats["active_events"], 0);

    let resp = app
        .auth_get("/api/users/admin/selectable", &admin.access_token)
        .send()
        .await
        .unwrap();
    let selectable: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(selectable.len(), 2);
    assert_eq!(selectable[0]["role"], "ADMIN");
    assert_eq!(selectable[1]["role"], "VOLUNTEER");
}
