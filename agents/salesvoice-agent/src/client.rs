use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::json;
use tracing::{error, info};

const TRANSCRIPT_TIMEOUT: Duration = Duration::from_secs(20);
const SAVE_TIMEOUT: Duration = Duration::from_secs(20);
const END_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Settle delay between save-session and end-call so the last transcript
/// sends in flight can land first.
const FINALIZE_SETTLE: Duration = Duration::from_secs(2);

/// HTTP client for the backend API. Every call has a finite timeout, and
/// failures are logged and swallowed: a backend hiccup must never take the
/// live conversation down with it.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn send_transcript(&self, session_id: &str, speaker: &str, text: &str) {
        let timestamp = unix_now();
        let result = self
            .http
            .post(format!("{}/api/transcript", self.base_url))
            .timeout(TRANSCRIPT_TIMEOUT)
            .json(&json!({
                "text": text,
                "speaker": speaker,
                "timestamp": timestamp,
                "session_id": session_id,
            }))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            error!(session_id, error = %e, "Transcript send failed");
        }
    }

    pub async fn save_session(&self, session_id: &str) {
        let result = self
            .http
            .post(format!("{}/api/session/{}/save", self.base_url, session_id))
            .timeout(SAVE_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            error!(session_id, error = %e, "Save session failed");
        }
    }

    pub async fn end_call(
        &self,
        session_id: &str,
        participant_id: &str,
        phone_number: Option<&str>,
    ) {
        let result = self
            .http
            .post(format!("{}/api/session/{}/end", self.base_url, session_id))
            .timeout(END_CALL_TIMEOUT)
            .json(&json!({
                "participant_id": participant_id,
                "phone_number": phone_number,
            }))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            error!(session_id, error = %e, "End call failed");
        }
    }

    /// Save the session snapshot, then request the one-time summary. The
    /// backend's uniqueness check makes replays of this sequence harmless.
    pub async fn finalize(
        &self,
        session_id: &str,
        participant_id: &str,
        phone_number: Option<&str>,
    ) {
        info!(session_id, "Finalizing session");
        self.save_session(session_id).await;
        tokio::time::sleep(FINALIZE_SETTLE).await;
        self.end_call(session_id, participant_id, phone_number).await;
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
