//! One-shot reminder sweep, meant to be run from cron.

use knowa_api::state::AppState;
use knowa_config::Settings;
use knowa_db::connect;
use knowa_services::ReminderService;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "knowa_api=info,knowa_services=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    let db = connect(&settings).await?;
    let state = AppState::new(db, settings.clone());

    info!(window_hours = settings.reminders.window_hours, "Checking for upcoming events and meetings");
    let reminders = ReminderService::new(
        state.events.clone(),
        state.notifier.clone(),
        settings.reminders.window_hours,
    );
    let report = reminders.run(chrono::Utc::now()).await?;

    info!(
        events = report.events,
        meetings = report.meetings,
        sent = report.sent,
        "Reminder check complete"
    );
    Ok(())
}
