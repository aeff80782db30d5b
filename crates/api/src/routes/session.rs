use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::DateTime;
use salesvoice_db::models::{CallDuration, CallSummary, Experience, Speaker, TranscriptEntry, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub speaker: Speaker,
    pub text: String,
    pub sent_ts: f64,
    pub received_at: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub saved_at: String,
    pub messages: Vec<MessageResponse>,
    pub total_messages: u32,
    pub latest_analysis: Option<Verdict>,
}

#[derive(Debug, Serialize)]
pub struct SessionListEntry {
    pub session_id: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub ok: bool,
    pub session_id: String,
    pub record_id: String,
    pub total_messages: u32,
}

#[derive(Debug, Deserialize)]
pub struct EndCallRequest {
    pub participant_id: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndCallResponse {
    pub ok: bool,
    pub summary_id: String,
    pub duration: CallDuration,
    pub already_finalized: bool,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Live (buffered) and saved sessions, deduped by id; the buffered count
/// wins for sessions present in both.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions: HashMap<String, usize> = HashMap::new();

    match state.sessions.list_recent(50).await {
        Ok(saved) => {
            for record in saved {
                sessions.insert(record.session_id, record.total_messages as usize);
            }
        }
        Err(e) => error!(error = %e, "Saved-session listing failed"),
    }
    for (session_id, count) in state.buffer.sessions() {
        sessions.insert(session_id, count);
    }

    let mut items: Vec<SessionListEntry> = sessions
        .into_iter()
        .map(|(session_id, count)| SessionListEntry { session_id, count })
        .collect();
    items.sort_by(|a, b| a.session_id.cmp(&b.session_id));

    Ok(Json(serde_json::json!({ "sessions": items })))
}

/// Saved record if one exists, otherwise a live view of the buffer.
pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    if let Some(record) = state.sessions.find_by_session(&session_id).await? {
        return Ok(Json(SessionResponse {
            session_id: record.session_id,
            saved_at: record.saved_at.try_to_rfc3339_string().unwrap_or_default(),
            messages: record.messages.into_iter().map(to_message).collect(),
            total_messages: record.total_messages,
            latest_analysis: record.latest_analysis,
        }));
    }

    let buffered = state.buffer.snapshot(&session_id);
    if buffered.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Session not found: {session_id}"
        )));
    }

    let total = buffered.len() as u32;
    Ok(Json(SessionResponse {
        session_id: session_id.clone(),
        saved_at: DateTime::now().try_to_rfc3339_string().unwrap_or_default(),
        messages: buffered.into_iter().map(to_message).collect(),
        total_messages: total,
        latest_analysis: state.verdicts.latest(&session_id),
    }))
}

/// Repeatable checkpoint: snapshot the buffer into the session record
/// (overwrite-by-id), refresh the whole-conversation analysis, leave the
/// buffer untouched.
pub async fn save(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SaveResponse>, ApiError> {
    let buffered = state.buffer.snapshot(&session_id);

    if buffered.is_empty() {
        // Nothing in memory (e.g. re-save after finalize or a restart):
        // succeed idempotently if a snapshot already exists.
        let existing = state
            .sessions
            .find_by_session(&session_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound("Session not found in memory or store".to_string())
            })?;
        return Ok(Json(SaveResponse {
            ok: true,
            session_id,
            record_id: existing.id.map(|id| id.to_hex()).unwrap_or_default(),
            total_messages: existing.total_messages,
        }));
    }

    info!(%session_id, messages = buffered.len(), "Analyzing full conversation");
    let analysis = state.sentiment.summarize_conversation(&buffered).await;

    let (record_id, total_messages) = state
        .sessions
        .save_snapshot(&session_id, buffered, Some(analysis))
        .await?;

    info!(%session_id, total_messages, "Session snapshot saved");

    Ok(Json(SaveResponse {
        ok: true,
        session_id,
        record_id: record_id.to_hex(),
        total_messages,
    }))
}

/// Recent messages: buffer plus durable mirror, re-sorted by `sent_ts`
/// (the two sources can disagree on arrival order), deduped, last `limit`.
pub async fn messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let buffered = state.buffer.snapshot(&session_id);
    let merged = if (buffered.len() as i64) < limit {
        let stored = match state.utterances.find_recent(&session_id, limit).await {
            Ok(stored) => stored
                .into_iter()
                .map(|u| TranscriptEntry {
                    speaker: u.speaker,
                    text: u.text,
                    sent_ts: u.sent_ts,
                    received_at: u.received_at,
                })
                .collect(),
            Err(e) => {
                error!(%session_id, error = %e, "Durable message query failed");
                Vec::new()
            }
        };
        merge_messages(buffered, stored, limit as usize)
    } else {
        buffered
    };

    let items: Vec<MessageResponse> = merged.into_iter().map(to_message).collect();
    Ok(Json(serde_json::json!({
        "session_id": session_id,
        "messages": items,
    })))
}

/// Latest per-utterance sentiment verdict, if any utterance was classified.
pub async fn analysis(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({
        "session_id": session_id,
        "analysis": state.verdicts.latest(&session_id),
    })))
}

/// Terminal finalize. Idempotent: replays and concurrent duplicates return
/// the first summary's id and duration as success.
pub async fn end(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<EndCallRequest>,
) -> Result<Json<EndCallResponse>, ApiError> {
    let outcome = state
        .finalizer
        .finalize(&session_id, &body.participant_id, body.phone_number)
        .await?;

    Ok(Json(EndCallResponse {
        ok: true,
        summary_id: outcome.summary_id.to_hex(),
        duration: outcome.duration,
        already_finalized: outcome.already_finalized,
    }))
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub participant_id: String,
    pub participant_email: Option<String>,
    pub participant_name: Option<String>,
    pub phone_number: Option<String>,
    pub summary: String,
    pub call_purpose: String,
    pub experience: Experience,
    pub duration: CallDuration,
    pub total_messages: u32,
    pub call_date: String,
}

pub async fn summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state
        .summaries
        .find_by_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Summary not found".to_string()))?;

    Ok(Json(to_summary_response(summary)))
}

pub(crate) fn to_summary_response(s: CallSummary) -> SummaryResponse {
    SummaryResponse {
        session_id: s.session_id,
        participant_id: s.participant_id,
        participant_email: s.participant_email,
        participant_name: s.participant_name,
        phone_number: s.phone_number,
        summary: s.summary,
        call_purpose: s.call_purpose,
        experience: s.experience,
        duration: s.duration,
        total_messages: s.total_messages,
        call_date: s.call_date.try_to_rfc3339_string().unwrap_or_default(),
    }
}

fn to_message(m: TranscriptEntry) -> MessageResponse {
    MessageResponse {
        speaker: m.speaker,
        text: m.text,
        sent_ts: m.sent_ts,
        received_at: m.received_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

/// Union of buffer and mirror, deduped (every buffered utterance was also
/// mirrored on ingest), ordered by `sent_ts`, trimmed to the newest `limit`.
fn merge_messages(
    buffered: Vec<TranscriptEntry>,
    stored: Vec<TranscriptEntry>,
    limit: usize,
) -> Vec<TranscriptEntry> {
    let mut seen: std::collections::HashSet<(u64, Speaker, String)> = std::collections::HashSet::new();
    let mut merged: Vec<TranscriptEntry> = Vec::new();
    for entry in buffered.into_iter().chain(stored) {
        if seen.insert((entry.sent_ts.to_bits(), entry.speaker, entry.text.clone())) {
            merged.push(entry);
        }
    }
    merged.sort_by(|a, b| a.sent_ts.total_cmp(&b.sent_ts));
    if merged.len() > limit {
        merged.drain(..merged.len() - limit);
    }
    merged
}
