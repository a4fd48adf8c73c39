use knowa_api::{build_router, state::AppState};
use knowa_config::Settings;
use knowa_db::indexes::ensure_indexes;
use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database and upload dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
    _uploads: tempfile::TempDir,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set KNOWA__DATABASE__URL env var to override the connection string.
    /// Each test gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(|_| {}).await
    }

    /// Spawn a test server with customized settings.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        let db_name = format!("knowa_test_{}", uuid::Uuid::new_v4().simple());
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        if let Ok(url) = std::env::var("KNOWA__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        settings.app.upload_dir = uploads.path().to_string_lossy().into_owned();
        // Never reach a real model from tests
        settings.ai.api_key = None;
        settings.admin.username = None;
        settings.admin.password = None;

        mutator(&mut settings);

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state = AppState::new(db.clone(), settings.clone());
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
            _uploads: uploads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Number of files currently stored under the upload directory.
    pub fn stored_upload_count(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return 0;
            };
            entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() { walk(&path) } else { 1 }
                })
                .sum()
        }
        walk(self._uploads.path())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: knowa_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
            upload_dir: "uploads".to_string(),
        },
        database: knowa_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "knowa_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: knowa_config::JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            issuer: "knowa".to_string(),
        },
        tac: knowa_config::TacSettings {
            ttl_secs: 300,
            length: 6,
        },
        mail: knowa_config::MailSettings {
            enabled: false,
            from: "noreply@knowa.test".to_string(),
            site_url: "http://localhost:5173".to_string(),
        },
        ai: knowa_config::AiSettings {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "http://127.0.0.1:9".to_string(),
            max_output_tokens: 256,
        },
        donations: knowa_config::DonationSettings { goal: 10000.0 },
        reminders: knowa_config::ReminderSettings { window_hours: 24 },
        admin: knowa_config::AdminSettings {
            username: None,
            email: None,
            password: None,
        },
    }
}
