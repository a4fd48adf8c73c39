pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod uploads;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(origins)
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/login/verify", post(routes::auth::verify))
        .route("/refresh", post(routes::auth::refresh))
        .route("/password-reset", post(routes::auth::password_reset))
        .route(
            "/password-reset/confirm",
            post(routes::auth::password_reset_confirm),
        )
        .route("/me", get(routes::auth::me));

    // Applicant side of the membership workflow
    let user_routes = Router::new()
        .route("/apply", post(routes::user::apply))
        .route("/payment-receipt", post(routes::user::upload_payment_receipt))
        .route("/schedule", get(routes::user::schedule))
        .route("/feedback", post(routes::user::submit_feedback))
        .route(
            "/interview/{user_id}/grade",
            post(routes::user::grade_interview),
        );

    let admin_routes = Router::new()
        .route("/pending", get(routes::user::list_pending))
        .route("/pending-payment", get(routes::user::list_pending_payment))
        .route("/staff", get(routes::user::list_staff))
        .route("/selectable", get(routes::user::list_selectable))
        .route("/stats", get(routes::user::stats))
        .route("/interviews/history", get(routes::user::interview_history))
        .route("/feedback", get(routes::user::list_feedback))
        .route("/interview/{user_id}", post(routes::user::schedule_interview))
        .route("/approve-member/{user_id}", post(routes::user::approve_member))
        .route(
            "/approve-volunteer/{user_id}",
            post(routes::user::approve_volunteer),
        )
        .route("/reject/{user_id}", post(routes::user::reject_application))
        .route(
            "/confirm-payment/{user_id}",
            post(routes::user::confirm_payment),
        )
        .route("/reject-payment/{user_id}", post(routes::user::reject_payment))
        .route("/{user_id}", get(routes::user::get_user));

    let event_routes = Router::new()
        .route(
            "/",
            get(routes::event::list).post(routes::event::create),
        )
        .route("/meetings", post(routes::event::create_meeting))
        .route("/meetings/{meeting_id}", get(routes::event::get_meeting))
        .route(
            "/{event_id}",
            get(routes::event::get)
                .put(routes::event::update)
                .delete(routes::event::delete),
        )
        .route(
            "/{event_id}/join-participant",
            post(routes::event::join_participant),
        )
        .route("/{event_id}/join-crew", post(routes::event::join_crew));

    let chat_routes = Router::new()
        .route(
            "/rooms",
            get(routes::chat::list_rooms).post(routes::chat::create_room),
        )
        .route("/rooms/{room_id}", get(routes::chat::get_room))
        .route(
            "/rooms/{room_id}/messages",
            get(routes::chat::list_messages).post(routes::chat::send_message),
        )
        .route("/rooms/{room_id}/pinned", get(routes::chat::pinned))
        .route("/rooms/{room_id}/read", post(routes::chat::mark_read))
        .route("/messages/{message_id}/pin", post(routes::chat::toggle_pin))
        .route("/messages/{message_id}/info", get(routes::chat::message_info));

    let donation_routes = Router::new()
        .route("/", post(routes::donation::create))
        .route("/mine", get(routes::donation::mine))
        .route("/goal", get(routes::donation::goal))
        .route("/resubmit", post(routes::donation::resubmit))
        .route("/admin/pending", get(routes::donation::list_pending))
        .route("/admin/{donation_id}/approve", post(routes::donation::approve))
        .route("/admin/{donation_id}/reject", post(routes::donation::reject));

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route(
            "/{notification_id}/read",
            post(routes::notification::mark_read),
        );

    let badge_routes = Router::new().route(
        "/",
        get(routes::badge::list).post(routes::badge::create),
    );

    let chatbot_routes = Router::new()
        .route(
            "/faqs",
            get(routes::chatbot::list_faqs).post(routes::chatbot::create_faq),
        )
        .route("/ask", post(routes::chatbot::ask));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/users/admin", admin_routes)
        .nest("/events", event_routes)
        .nest("/chat", chat_routes)
        .nest("/donations", donation_routes)
        .nest("/notifications", notification_routes)
        .nest("/badges", badge_routes)
        .nest("/chatbot", chatbot_routes)
        .route("/files/{*key}", get(routes::files::download));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
