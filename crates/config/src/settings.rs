use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub tac: TacSettings,
    pub mail: MailSettings,
    pub ai: AiSettings,
    pub donations: DonationSettings,
    pub reminders: ReminderSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub upload_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Time-limited access codes used for two-factor login and password reset.
#[derive(Debug, Deserialize, Clone)]
pub struct TacSettings {
    pub ttl_secs: u64,
    pub length: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub enabled: bool,
    pub from: String,
    pub site_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DonationSettings {
    pub goal: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReminderSettings {
    pub window_hours: i64,
}

/// Optional superuser created at startup when both fields are set.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSettings {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("KNOWA"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.upload_dir", "uploads")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "knowa")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "knowa")?
            .set_default("tac.ttl_secs", 300)?
            .set_default("tac.length", 6)?
            .set_default("mail.enabled", false)?
            .set_default("mail.from", "noreply@knowa-app.online")?
            .set_default("mail.site_url", "https://knowa-app.online")?
            .set_default("ai.api_key", None::<String>)?
            .set_default("ai.model", "gemini-2.0-flash")?
            .set_default(
                "ai.endpoint",
                "https://generativelanguage.googleapis.com/v1beta/models",
            )?
            .set_default("ai.max_output_tokens", 1024)?
            .set_default("donations.goal", 10000.0)?
            .set_default("reminders.window_hours", 24)?
            .set_default("admin.username", None::<String>)?
            .set_default("admin.email", None::<String>)?
            .set_default("admin.password", None::<String>)?
            .build()?;

        config.try_deserialize()
    }
}
