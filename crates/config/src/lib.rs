use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub api_key: String,
    /// Model used for per-utterance classification and call summaries.
    pub model: String,
    /// Model used for whole-conversation analysis on session save.
    pub summary_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RtcSettings {
    pub api_key: String,
    pub api_secret: String,
    pub ws_url: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub mongo: MongoSettings,
    pub gemini: GeminiSettings,
    pub rtc: RtcSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Layered load: built-in defaults, optional `config/default.toml`,
    /// then `SALESVOICE__*` env overrides (e.g. `SALESVOICE__MONGO__URI`).
    /// A handful of well-known flat env vars (MONGODB_URI, GOOGLE_API_KEY,
    /// LIVEKIT_*) are honored last so deployments keep their existing names.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("mongo.uri", "mongodb://localhost:27017")?
            .set_default("mongo.database", "salesvoice")?
            .set_default("gemini.api_key", "")?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default("gemini.summary_model", "gemini-2.0-flash")?
            .set_default("gemini.timeout_secs", 20)?
            .set_default("rtc.api_key", "")?
            .set_default("rtc.api_secret", "")?
            .set_default("rtc.ws_url", "ws://localhost:7880")?
            .set_default("rtc.token_ttl_minutes", 360)?
            .set_default("auth.jwt_secret", "change-me")?
            .set_default("auth.token_ttl_minutes", 1440)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("SALESVOICE").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_flat_env();
        Ok(settings)
    }

    fn apply_flat_env(&mut self) {
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            self.mongo.uri = uri;
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Ok(key) = std::env::var("LIVEKIT_API_KEY") {
            self.rtc.api_key = key;
        }
        if let Ok(secret) = std::env::var("LIVEKIT_API_SECRET") {
            self.rtc.api_secret = secret;
        }
        if let Ok(url) = std::env::var("LIVEKIT_WS_URL") {
            self.rtc.ws_url = url;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }
}
