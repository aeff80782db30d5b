use axum::{Json, extract::State};
use bson::DateTime;
use salesvoice_db::models::{Speaker, TranscriptEntry, Utterance, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: String,
    pub speaker: Speaker,
    /// Sender-side unix timestamp (seconds).
    pub timestamp: f64,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    pub session_id: String,
    pub count_in_session: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_user_message: Option<String>,
}

/// One streamed utterance from the voice agent. Appends to the in-memory
/// buffer (authoritative), mirrors to the durable store (best-effort), and
/// classifies customer speech inline.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation("Empty message".to_string()));
    }
    if body.session_id.trim().is_empty() {
        return Err(ApiError::Validation("Missing session_id".to_string()));
    }

    let received_at = DateTime::now();
    let entry = TranscriptEntry {
        speaker: body.speaker,
        text: text.clone(),
        sent_ts: body.timestamp,
        received_at,
    };
    let count_in_session = state.buffer.append(&body.session_id, entry);

    // Mirror failure must not interrupt the conversation: the buffer stays
    // authoritative until finalize.
    let mirrored = Utterance {
        id: None,
        session_id: body.session_id.clone(),
        speaker: body.speaker,
        text: text.clone(),
        sent_ts: body.timestamp,
        received_at,
    };
    if let Err(e) = state.utterances.mirror(&mirrored).await {
        error!(session_id = %body.session_id, error = %e, "Utterance mirror failed");
    }

    let mut analysis = None;
    let mut latest_user_message = None;
    if body.speaker == Speaker::User {
        let verdict = state.sentiment.classify(&text).await;
        info!(
            session_id = %body.session_id,
            sentiment = %verdict.sentiment,
            confidence = verdict.confidence,
            "Utterance classified"
        );
        state.verdicts.store(&body.session_id, verdict.clone());
        analysis = Some(verdict);
        latest_user_message = Some(text);
    }

    Ok(Json(IngestResponse {
        ok: true,
        session_id: body.session_id,
        count_in_session,
        analysis,
        latest_user_message,
    }))
}
