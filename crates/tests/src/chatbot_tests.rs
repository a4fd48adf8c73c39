use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn seed_faqs(app: &TestApp, token: &str) {
    let faqs = [
        ("How do I join?", "Register and apply.", "all", 1),
        ("Where do organizers upload reports?", "In the admin panel.", "organizer", 2),
        ("What should participants bring?", "Water and a hat.", "participant", 3),
        ("When do crew arrive?", "One hour early.", "crew", 4),
    ];
    for (question, answer, role, order) in faqs {
        let resp = app
            .auth_post("/api/chatbot/faqs", token)
            .json(&serde_json::json!({
                "question": question,
                "answer": answer,
                "target_role": role,
                "order": order,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
    }
}

fn questions(faqs: &[Value]) -> Vec<&str> {
    faqs.iter().map(|f| f["question"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn faqs_are_filtered_by_role() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;
    seed_faqs(&app, &admin.access_token).await;

    let resp = app.client.get(app.url("/api/chatbot/faqs")).send().await.unwrap();
    let guest: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(
        questions(&guest),
        ["How do I join?", "What should participants bring?"]
    );

    let resp = app.auth_get("/api/chatbot/faqs", &member.access_token).send().await.unwrap();
    let member_view: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(questions(&member_view), questions(&guest));

    let resp = app.auth_get("/api/chatbot/faqs", &admin.access_token).send().await.unwrap();
    let staff: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(
        questions(&staff),
        ["How do I join?", "Where do organizers upload reports?"]
    );
}

#[tokio::test]
async fn only_staff_create_faqs() {
    let app = TestApp::spawn().await;
    let member = app.seed_user("amina", "MEMBER", false).await;

    let resp = app
        .auth_post("/api/chatbot/faqs", &member.access_token)
        .json(&serde_json::json!({ "question": "Q", "answer": "A" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn ask_requires_a_message() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/chatbot/ask"))
        .json(&serde_json::json!({ "message": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn ask_without_model_key_is_unavailable() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/chatbot/ask"))
        .json(&serde_json::json!({ "message": "How do I volunteer?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 503);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "unavailable");
}

#[tokio::test]
async fn feedback_is_listed_for_staff() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin("admin").await;
    let member = app.seed_user("amina", "MEMBER", false).await;

    let resp = app
        .auth_post("/api/users/feedback", &member.access_token)
        .json(&serde_json::json!({ "subject": "App", "message": "Love the chat", "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_post("/api/users/feedback", &member.access_token)
        .json(&serde_json::json!({ "subject": "App", "message": "Too high", "rating": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .auth_get("/api/users/admin/feedback", &admin.access_token)
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["message"], "Love the chat");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
