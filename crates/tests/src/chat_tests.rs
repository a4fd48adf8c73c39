use crate::fixtures::{seed::SeededUser, test_app::TestApp};
use serde_json::Value;

/// Applicant, admin scheduler and member interviewer sharing an interview room.
async fn interview_room(app: &TestApp) -> (SeededUser, SeededUser, SeededUser, String) {
    let admin = app.seed_admin("admin").await;
    let interviewer = app.seed_user("kamal", "MEMBER", false).await;
    let applicant = app.seed_user("amina", "PENDING", false).await;

    let when = chrono::Utc::now() + chrono::Duration::days(1);
    let resp = app
        .auth_post(
            &format!("/api/users/admin/interview/{}", applicant.id),
            &admin.access_token,
        )
        .json(&serde_json::json!({
            "date_time": when.to_rfc3339(),
            "interviewer_id": interviewer.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let room_id = json["chat_room_id"].as_str().unwrap().to_string();
    (admin, interviewer, applicant, room_id)
}

async fn send(app: &TestApp, token: &str, room_id: &str, content: &str) -> Value {
    let resp = app
        .auth_post(&format!("/api/chat/rooms/{}/messages", room_id), token)
        .json(&serde_json::json!({ "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    resp.json().await.unwrap()
}

async fn mark_read(app: &TestApp, token: &str, room_id: &str) -> u64 {
    let resp = app
        .auth_post(&format!("/api/chat/rooms/{}/read", room_id), token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    json["updated"].as_u64().unwrap()
}

async fn messages(app: &TestApp, token: &str, room_id: &str) -> Vec<Value> {
    let resp = app
        .auth_get(&format!("/api/chat/rooms/{}/messages", room_id), token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

async fn join_participant(app: &TestApp, token: &str, event_id: &str) {
    let resp = app
        .auth_post(&format!("/api/events/{}/join-participant", event_id), token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

/// `is_read` of `message` as currently listed in its room.
async fn read_flag(app: &TestApp, token: &str, room_id: &str, message: &Value) -> bool {
    messages(app, token, room_id)
        .await
        .iter()
        .find(|m| m["id"] == message["id"])
        .and_then(|m| m["is_read"].as_bool())
        .unwrap()
}

#[tokio::test]
async fn message_is_read_once_every_other_member_reads_it() {
    let app = TestApp::spawn().await;
    let (admin, interviewer, applicant, room_id) = interview_room(&app).await;

    let sent = send(&app, &applicant.access_token, &room_id, "Hello, looking forward to it").await;
    let message_id = sent["id"].as_str().unwrap().to_string();
    assert_eq!(sent["is_read"], false);

    assert_eq!(mark_read(&app, &admin.access_token, &room_id).await, 1);
    let list = messages(&app, &applicant.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], false);

    let resp = app
        .auth_get(&format!("/api/chat/messages/{}/info", message_id), &applicant.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let info: Value = resp.json().await.unwrap();
    assert_eq!(info["message"], "Hello, looking forward to it");
    assert_eq!(info["read_by"].as_array().unwrap().len(), 1);
    assert_eq!(info["read_by"][0]["username"], "admin");
    assert_eq!(info["delivered_to"].as_array().unwrap().len(), 1);
    assert_eq!(info["delivered_to"][0]["username"], "kamal");

    assert_eq!(mark_read(&app, &interviewer.access_token, &room_id).await, 1);
    let list = messages(&app, &applicant.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], true);

    // Marking again changes nothing
    assert_eq!(mark_read(&app, &interviewer.access_token, &room_id).await, 0);
    let list = messages(&app, &applicant.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], true);
}

#[tokio::test]
async fn sender_reading_own_room_does_not_count() {
    let app = TestApp::spawn().await;
    let (_admin, _interviewer, applicant, room_id) = interview_room(&app).await;

    send(&app, &applicant.access_token, &room_id, "Anyone there?").await;
    assert_eq!(mark_read(&app, &applicant.access_token, &room_id).await, 0);

    let list = messages(&app, &applicant.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], false);
}

#[tokio::test]
async fn only_sender_sees_message_info() {
    let app = TestApp::spawn().await;
    let (admin, _interviewer, applicant, room_id) = interview_room(&app).await;

    let sent = send(&app, &applicant.access_token, &room_id, "Hi").await;
    let message_id = sent["id"].as_str().unwrap();

    let resp = app
        .auth_get(&format!("/api/chat/messages/{}/info", message_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn outsiders_cannot_read_or_post() {
    let app = TestApp::spawn().await;
    let (_admin, _interviewer, _applicant, room_id) = interview_room(&app).await;
    let outsider = app.seed_user("outsider", "MEMBER", false).await;

    let resp = app
        .auth_get(&format!("/api/chat/rooms/{}/messages", room_id), &outsider.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/chat/rooms/{}/messages", room_id), &outsider.access_token)
        .json(&serde_json::json!({ "content": "let me in" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let app = TestApp::spawn().await;
    let (_admin, _interviewer, applicant, room_id) = interview_room(&app).await;

    let resp = app
        .auth_post(&format!("/api/chat/rooms/{}/messages", room_id), &applicant.access_token)
        .json(&serde_json::json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn event_room_pinning_is_limited_to_organizer_crew_and_members() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let guest = app.seed_user("guest", "PUBLIC", false).await;
    let event_id = app.seed_event(&admin, "Beach Cleanup", 10, 5).await;

    let resp = app
        .auth_post(&format!("/api/events/{}/join-participant", event_id), &guest.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.auth_get("/api/chat/rooms", &guest.access_token).send().await.unwrap();
    let rooms: Vec<Value> = resp.json().await.unwrap();
    let room = rooms
        .iter()
        .find(|r| r["event_id"] == event_id.as_str())
        .expect("event room visible to participant");
    assert_eq!(room["name"], "Beach Cleanup");
    assert_eq!(room["last_message"], "No messages yet");
    let room_id = room["id"].as_str().unwrap().to_string();

    let sent = send(&app, &guest.access_token, &room_id, "What should I bring?").await;
    let message_id = sent["id"].as_str().unwrap().to_string();

    // Event participants are not room members and cannot pin
    let resp = app
        .auth_post(&format!("/api/chat/messages/{}/pin", message_id), &guest.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(&format!("/api/chat/messages/{}/pin", message_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["is_pinned"], true);

    let resp = app
        .auth_get(&format!("/api/chat/rooms/{}/pinned", room_id), &guest.access_token)
        .send()
        .await
        .unwrap();
    let pinned: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0]["sender_name"], "guest");

    // Toggling again unpins
    let resp = app
        .auth_post(&format!("/api/chat/messages/{}/pin", message_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["is_pinned"], false);

    // The organizer's read completes the audience
    assert_eq!(mark_read(&app, &admin.access_token, &room_id).await, 1);
    let list = messages(&app, &guest.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], true);
}

#[tokio::test]
async fn staff_create_direct_rooms() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;

    let resp = app
        .auth_post("/api/chat/rooms", &member.access_token)
        .json(&serde_json::json!({ "name": "Committee" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post("/api/chat/rooms", &admin.access_token)
        .json(&serde_json::json!({
            "name": "Committee",
            "participants": [member.id],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let room: Value = resp.json().await.unwrap();
    assert_eq!(room["type"], "DIRECT");
    assert_eq!(room["participants"].as_array().unwrap().len(), 2);

    let resp = app.auth_get("/api/chat/rooms", &member.access_token).send().await.unwrap();
    let rooms: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "Committee");
}

#[tokio::test]
async fn read_flag_survives_a_growing_event_audience() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let amina = app.seed_user("amina", "PUBLIC", false).await;
    let bilal = app.seed_user("bilal", "PUBLIC", false).await;
    let event_id = app.seed_event(&admin, "Tree Planting", 10, 5).await;

    join_participant(&app, &amina.access_token, &event_id).await;

    let resp = app.auth_get("/api/chat/rooms", &amina.access_token).send().await.unwrap();
    let rooms: Vec<Value> = resp.json().await.unwrap();
    let room_id = rooms
        .iter()
        .find(|r| r["event_id"] == event_id.as_str())
        .and_then(|r| r["id"].as_str())
        .unwrap()
        .to_string();

    let first = send(&app, &amina.access_token, &room_id, "See you there").await;
    assert_eq!(mark_read(&app, &admin.access_token, &room_id).await, 1);
    assert!(read_flag(&app, &admin.access_token, &room_id, &first).await);

    // A later participant widens the audience but does not unread old messages
    join_participant(&app, &bilal.access_token, &event_id).await;
    assert!(read_flag(&app, &admin.access_token, &room_id, &first).await);

    let second = send(&app, &admin.access_token, &room_id, "Gloves are provided").await;
    assert_eq!(mark_read(&app, &bilal.access_token, &room_id).await, 2);
    assert!(read_flag(&app, &admin.access_token, &room_id, &first).await);
    assert!(!read_flag(&app, &admin.access_token, &room_id, &second).await);

    assert_eq!(mark_read(&app, &amina.access_token, &room_id).await, 1);
    assert!(read_flag(&app, &admin.access_token, &room_id, &second).await);
}

#[tokio::test]
async fn rescheduling_adds_new_interviewer_without_unreading() {
    let app = TestApp::spawn().await;
    let (admin, interviewer, applicant, room_id) = interview_room(&app).await;

    send(&app, &applicant.access_token, &room_id, "Is the time fixed?").await;
    mark_read(&app, &admin.access_token, &room_id).await;
    mark_read(&app, &interviewer.access_token, &room_id).await;
    let list = messages(&app, &applicant.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], true);

    let replacement = app.seed_user("farah", "MEMBER", false).await;
    let when = chrono::Utc::now() + chrono::Duration::days(2);
    let resp = app
        .auth_post(
            &format!("/api/users/admin/interview/{}", applicant.id),
            &admin.access_token,
        )
        .json(&serde_json::json!({
            "date_time": when.to_rfc3339(),
            "interviewer_id": replacement.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["chat_room_id"], room_id.as_str());

    // Previous members stay and the new interviewer is merged in
    let resp = app
        .auth_get(&format!("/api/chat/rooms/{}", room_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    let room: Value = resp.json().await.unwrap();
    let members = room["participants"].as_array().unwrap();
    assert_eq!(members.len(), 4);
    assert!(members.iter().any(|m| m == interviewer.id.as_str()));
    assert!(members.iter().any(|m| m == replacement.id.as_str()));

    let list = messages(&app, &replacement.access_token, &room_id).await;
    assert_eq!(list[0]["is_read"], true);
}
