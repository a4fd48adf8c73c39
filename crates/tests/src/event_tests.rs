use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn join(app: &TestApp, token: &str, event_id: &str, role: &str) -> reqwest::Response {
    app.auth_post(&format!("/api/events/{}/join-{}", event_id, role), token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn creating_an_event_creates_its_chat_room() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let event_id = app.seed_event(&admin, "Book Drive", 50, 10).await;

    let resp = app.auth_get("/api/chat/rooms", &admin.access_token).send().await.unwrap();
    let rooms: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["type"], "EVENT");
    assert_eq!(rooms[0]["event_id"], event_id.as_str());
    assert_eq!(rooms[0]["name"], "Book Drive");
}

#[tokio::test]
async fn guests_only_see_upcoming_published_events() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    app.seed_event(&admin, "Published", 50, 10).await;

    let start = chrono::Utc::now() + chrono::Duration::days(3);
    let resp = app
        .auth_post("/api/events", &admin.access_token)
        .json(&serde_json::json!({
            "title": "Draft",
            "start_time": start.to_rfc3339(),
            "end_time": (start + chrono::Duration::hours(1)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let draft: Value = resp.json().await.unwrap();
    assert_eq!(draft["status"], "DRAFT");
    assert_eq!(draft["capacity_participants"], 50);
    assert_eq!(draft["capacity_crew"], 10);

    let resp = app.client.get(app.url("/api/events")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let public: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["title"], "Published");

    let resp = app.auth_get("/api/events", &admin.access_token).send().await.unwrap();
    let all: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;

    let start = chrono::Utc::now() + chrono::Duration::days(3);
    let resp = app
        .auth_post("/api/events", &admin.access_token)
        .json(&serde_json::json!({
            "title": "Backwards",
            "start_time": start.to_rfc3339(),
            "end_time": (start - chrono::Duration::hours(1)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn join_enforces_role_tiers() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let guest = app.seed_user("guest", "PUBLIC", false).await;
    let member = app.seed_user("amina", "MEMBER", false).await;
    let event_id = app.seed_event(&admin, "Food Bank", 10, 10).await;

    assert_eq!(join(&app, &guest.access_token, &event_id, "crew").await.status().as_u16(), 403);
    assert_eq!(join(&app, &member.access_token, &event_id, "participant").await.status().as_u16(), 403);
    assert_eq!(join(&app, &admin.access_token, &event_id, "participant").await.status().as_u16(), 403);

    let resp = join(&app, &member.access_token, &event_id, "crew").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["crew_count"], 1);

    let resp = join(&app, &guest.access_token, &event_id, "participant").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["participants_count"], 1);
}

#[tokio::test]
async fn joining_twice_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let guest = app.seed_user("guest", "PUBLIC", false).await;
    let event_id = app.seed_event(&admin, "Food Bank", 10, 10).await;

    assert_eq!(join(&app, &guest.access_token, &event_id, "participant").await.status().as_u16(), 200);
    let resp = join(&app, &guest.access_token, &event_id, "participant").await;
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn full_event_reports_capacity() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let first = app.seed_user("first", "PUBLIC", false).await;
    let second = app.seed_user("second", "PUBLIC", false).await;
    let event_id = app.seed_event(&admin, "Small Workshop", 1, 1).await;

    assert_eq!(join(&app, &first.access_token, &event_id, "participant").await.status().as_u16(), 200);
    let resp = join(&app, &second.access_token, &event_id, "participant").await;
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "capacity");
}

#[tokio::test]
async fn concurrent_joins_never_exceed_capacity() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let event_id = app.seed_event(&admin, "Limited Seats", 2, 1).await;

    let mut tokens = Vec::new();
    for i in 0..6 {
        let user = app.seed_user(&format!("guest{}", i), "PUBLIC", false).await;
        tokens.push(user.access_token);
    }

    let attempts = tokens
        .iter()
        .map(|token| join(&app, token, &event_id, "participant"));
    let results: Vec<u16> = futures::future::join_all(attempts)
        .await
        .iter()
        .map(|r| r.status().as_u16())
        .collect();
    let accepted = results.iter().filter(|s| **s == 200).count();
    let full = results.iter().filter(|s| **s == 409).count();
    assert_eq!(accepted, 2);
    assert_eq!(full, 4);

    let resp = app
        .auth_get(&format!("/api/events/{}", event_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    let event: Value = resp.json().await.unwrap();
    assert_eq!(event["participants_count"], 2);
}

#[tokio::test]
async fn draft_events_are_not_joinable() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let guest = app.seed_user("guest", "PUBLIC", false).await;
    let event_id = app.seed_event(&admin, "Soon", 10, 10).await;

    let resp = app
        .auth_put(&format!("/api/events/{}", event_id), &admin.access_token)
        .json(&serde_json::json!({ "status": "DRAFT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = join(&app, &guest.access_token, &event_id, "participant").await;
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn staff_update_and_delete_events() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;
    let event_id = app.seed_event(&admin, "Old Title", 10, 10).await;

    let resp = app
        .auth_put(&format!("/api/events/{}", event_id), &member.access_token)
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&format!("/api/events/{}", event_id), &admin.access_token)
        .json(&serde_json::json!({ "title": "New Title", "capacity_participants": 20 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["title"], "New Title");
    assert_eq!(json["capacity_participants"], 20);

    let resp = app
        .auth_delete(&format!("/api/events/{}", event_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .client
        .get(app.url(&format!("/api/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn meetings_appear_on_participant_schedule() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;
    let outsider = app.seed_user("outsider", "MEMBER", false).await;

    let start = chrono::Utc::now() + chrono::Duration::days(1);
    let resp = app
        .auth_post("/api/events/meetings", &admin.access_token)
        .json(&serde_json::json!({
            "title": "Volunteer briefing",
            "start_time": start.to_rfc3339(),
            "end_time": (start + chrono::Duration::hours(1)).to_rfc3339(),
            "is_online": true,
            "location": "https://meet.example.org/briefing",
            "participants": [member.id],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let meeting: Value = resp.json().await.unwrap();
    let meeting_id = meeting["id"].as_str().unwrap();

    let resp = app
        .auth_get(&format!("/api/events/meetings/{}", meeting_id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get(&format!("/api/events/meetings/{}", meeting_id), &outsider.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_get("/api/users/schedule", &member.access_token)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "MEETING");
    assert_eq!(items[0]["location"], "Online");
    assert_eq!(items[0]["meeting_link"], "https://meet.example.org/briefing");
}
