use std::time::Duration;

use mongodb::Database;
use salesvoice_api::{build_router, state::AppState};
use salesvoice_config::{
    AuthSettings, GeminiSettings, MongoSettings, RtcSettings, ServerSettings, Settings,
};

/// Spawns the full API router on an ephemeral port against a uniquely-named
/// test database. Suites call `TestApp::spawn()` and skip when it returns
/// `None` (no MongoDB reachable, e.g. a checkout without docker services).
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub db: Database,
}

impl TestApp {
    pub async fn spawn() -> Option<TestApp> {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mut options = match mongodb::options::ClientOptions::parse(&uri).await {
            Ok(options) => options,
            Err(e) => {
                eprintln!("skipping: invalid MONGODB_URI: {e}");
                return None;
            }
        };
        options.server_selection_timeout = Some(Duration::from_secs(2));

        let client = mongodb::Client::with_options(options).ok()?;
        if let Err(e) = client
            .database("admin")
            .run_command(bson::doc! { "ping": 1 })
            .await
        {
            eprintln!("skipping: MongoDB not reachable: {e}");
            return None;
        }

        let db_name = format!("salesvoice_test_{}", uuid::Uuid::new_v4().simple());
        let db = client.database(&db_name);
        salesvoice_db::indexes::ensure_indexes(&db).await.ok()?;

        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            mongo: MongoSettings {
                uri,
                database: db_name,
            },
            // No API key: every model call fails fast and exercises the
            // fallback paths, which is exactly what the contracts promise.
            gemini: GeminiSettings {
                api_key: String::new(),
                model: "gemini-2.5-flash".to_string(),
                summary_model: "gemini-2.0-flash".to_string(),
                timeout_secs: 2,
            },
            rtc: RtcSettings {
                api_key: "testkey".to_string(),
                api_secret: "testsecret".to_string(),
                ws_url: "ws://localhost:7880".to_string(),
                token_ttl_minutes: 60,
            },
            auth: AuthSettings {
                jwt_secret: "test-jwt-secret".to_string(),
                token_ttl_minutes: 60,
            },
        };

        let state = AppState::new(&settings, db.clone());
        let router = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.ok()?;
        let addr = listener.local_addr().ok()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Some(TestApp {
            address: format!("http://{addr}"),
            client: reqwest::Client::new(),
            db,
        })
    }

    pub async fn ingest(&self, session_id: &str, speaker: &str, text: &str, timestamp: f64) {
        let resp = self
            .client
            .post(format!("{}/api/transcript", self.address))
            .json(&serde_json::json!({
                "text": text,
                "speaker": speaker,
                "timestamp": timestamp,
                "session_id": session_id,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "ingest failed");
    }

    pub async fn end_call(&self, session_id: &str, participant_id: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/session/{}/end", self.address, session_id))
            .json(&serde_json::json!({ "participant_id": participant_id }))
            .send()
            .await
            .unwrap()
    }

    pub async fn summary_count(&self, session_id: &str) -> u64 {
        self.db
            .collection::<bson::Document>("call_summaries")
            .count_documents(bson::doc! { "session_id": session_id })
            .await
            .unwrap()
    }

    pub async fn cleanup(self) {
        let _ = self.db.drop().await;
    }
}
