use std::sync::Arc;

use bson::{DateTime, oid::ObjectId};
use salesvoice_db::models::{CallDuration, CallSummary, TranscriptEntry, User};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::dao::base::DaoError;
use crate::dao::summary::SummaryDao;
use crate::dao::user::UserDao;
use crate::dao::utterance::UtteranceDao;
use crate::sentiment::{SentimentClient, tail_chars};
use crate::session::buffer::{UtteranceBuffer, VerdictCache};

const TRANSCRIPT_CHAR_CAP: usize = 3000;

#[derive(Debug, Error)]
pub enum FinalizeError {
    /// The only hard failure: no utterances in the buffer and none in the
    /// durable mirror.
    #[error("No utterances found for session")]
    NoUtterances,
    #[error(transparent)]
    Store(#[from] DaoError),
}

#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub summary_id: ObjectId,
    pub duration: CallDuration,
    /// True when another finalize attempt (this process or another) already
    /// produced the summary; reported as success, never as an error.
    pub already_finalized: bool,
}

/// The session lifecycle's terminal step: OPEN → FINALIZING → FINALIZED.
///
/// Any of the termination triggers may invoke `finalize` concurrently, from
/// more than one process. Idempotence rests on two guards: the summary
/// existence check up front, and, for true concurrent races the check
/// cannot see, the store's unique index on `call_summaries.session_id`,
/// whose duplicate-key rejection is converted back into success here.
pub struct SessionFinalizer {
    buffer: Arc<UtteranceBuffer>,
    verdicts: Arc<VerdictCache>,
    utterances: Arc<UtteranceDao>,
    summaries: Arc<SummaryDao>,
    users: Arc<UserDao>,
    sentiment: Arc<SentimentClient>,
}

impl SessionFinalizer {
    pub fn new(
        buffer: Arc<UtteranceBuffer>,
        verdicts: Arc<VerdictCache>,
        utterances: Arc<UtteranceDao>,
        summaries: Arc<SummaryDao>,
        users: Arc<UserDao>,
        sentiment: Arc<SentimentClient>,
    ) -> Self {
        Self {
            buffer,
            verdicts,
            utterances,
            summaries,
            users,
            sentiment,
        }
    }

    pub async fn finalize(
        &self,
        session_id: &str,
        participant_id: &str,
        phone_number: Option<String>,
    ) -> Result<FinalizeOutcome, FinalizeError> {
        // Fast path: already finalized. Same id and duration every time.
        if let Some(existing) = self.summaries.find_by_session(session_id).await? {
            info!(session_id, "Summary already exists, finalize is a no-op");
            return Ok(existing_outcome(existing));
        }

        let messages = self.resolve_utterances(session_id).await?;
        if messages.is_empty() {
            return Err(FinalizeError::NoUtterances);
        }

        let seconds = duration_seconds(&messages);
        let duration = CallDuration {
            seconds,
            mmss: format_mmss(seconds),
        };

        let transcript = tail_chars(&render_transcript(&messages), TRANSCRIPT_CHAR_CAP);
        let report = self.sentiment.summarize_call(&transcript).await;

        // Participant metadata is best-effort: a missing or unparseable id
        // degrades to an anonymous summary.
        let user = self.lookup_participant(participant_id).await;
        let phone = phone_number.or_else(|| user.as_ref().and_then(|u| u.phone_number.clone()));

        let now = DateTime::now();
        let summary = CallSummary {
            id: None,
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
            participant_email: user.as_ref().map(|u| u.email.clone()),
            participant_name: user.as_ref().map(|u| u.full_name.clone()),
            phone_number: phone,
            summary: report.summary,
            call_purpose: report.call_purpose,
            experience: report.experience,
            duration: duration.clone(),
            total_messages: messages.len() as u32,
            call_date: now,
            created_at: now,
        };

        let outcome = match self.summaries.insert(&summary).await {
            Ok(summary_id) => {
                info!(session_id, seconds, "Call summary written");
                FinalizeOutcome {
                    summary_id,
                    duration,
                    already_finalized: false,
                }
            }
            // Lost the race against a concurrent finalize: the unique index
            // kept the store single-summary. Treat as success.
            Err(DaoError::DuplicateKey(_)) => {
                warn!(session_id, "Concurrent finalize detected, reusing existing summary");
                let existing = self
                    .summaries
                    .find_by_session(session_id)
                    .await?
                    .ok_or(DaoError::NotFound)?;
                existing_outcome(existing)
            }
            Err(e) => return Err(e.into()),
        };

        // FINALIZED: release per-session in-memory state.
        self.buffer.clear(session_id);
        self.verdicts.clear(session_id);

        Ok(outcome)
    }

    /// The buffer is authoritative while it holds anything for the session;
    /// the durable mirror is consulted only when it is empty or lost.
    async fn resolve_utterances(
        &self,
        session_id: &str,
    ) -> Result<Vec<TranscriptEntry>, FinalizeError> {
        let buffered = self.buffer.snapshot(session_id);
        if !buffered.is_empty() {
            return Ok(buffered);
        }

        match self.utterances.find_by_session_prefix(session_id).await {
            Ok(stored) => Ok(stored
                .into_iter()
                .map(|u| TranscriptEntry {
                    speaker: u.speaker,
                    text: u.text,
                    sent_ts: u.sent_ts,
                    received_at: u.received_at,
                })
                .collect()),
            Err(e) => {
                error!(session_id, error = %e, "Durable fallback lookup failed");
                Ok(Vec::new())
            }
        }
    }

    async fn lookup_participant(&self, participant_id: &str) -> Option<User> {
        let oid = ObjectId::parse_str(participant_id).ok()?;
        match self.users.find_by_id(oid).await {
            Ok(user) => user,
            Err(e) => {
                error!(participant_id, error = %e, "Participant lookup failed");
                None
            }
        }
    }
}

fn existing_outcome(existing: CallSummary) -> FinalizeOutcome {
    // Documents read back from the store always carry an id.
    FinalizeOutcome {
        summary_id: existing.id.unwrap_or_else(ObjectId::new),
        duration: existing.duration,
        already_finalized: true,
    }
}

/// `max(0, round(last.sent_ts - first.sent_ts))` where first/last are by
/// `sent_ts`: the sender-side clock defines duration even when arrival
/// order disagrees.
pub fn duration_seconds(messages: &[TranscriptEntry]) -> i64 {
    let mut ts = messages.iter().map(|m| m.sent_ts);
    let Some(first) = ts.next() else { return 0 };
    let (min, max) = ts.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    (max - min).round().max(0.0) as i64
}

/// Renders seconds as `M:SS`.
pub fn format_mmss(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `speaker: text` transcript lines fed to the call summarizer.
pub fn render_transcript(messages: &[TranscriptEntry]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.speaker, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use salesvoice_db::models::Speaker;

    fn msg(speaker: Speaker, text: &str, sent_ts: f64) -> TranscriptEntry {
        TranscriptEntry {
            speaker,
            text: text.to_string(),
            sent_ts,
            received_at: DateTime::now(),
        }
    }

    #[test]
    fn duration_from_sent_timestamps() {
        let messages = vec![
            msg(Speaker::User, "I'm interested", 0.0),
            msg(Speaker::Assistant, "Great, let's talk pricing", 5.0),
            msg(Speaker::User, "Too expensive", 12.0),
        ];
        assert_eq!(duration_seconds(&messages), 12);
        assert_eq!(format_mmss(duration_seconds(&messages)), "0:12");
    }

    #[test]
    fn duration_ignores_arrival_order() {
        // Network reordering delivered the earliest-sent message last.
        let messages = vec![
            msg(Speaker::Assistant, "hello", 3.0),
            msg(Speaker::User, "hi", 0.5),
            msg(Speaker::User, "bye", 12.4),
        ];
        assert_eq!(duration_seconds(&messages), 12);
    }

    #[test]
    fn duration_of_single_or_empty_is_zero() {
        assert_eq!(duration_seconds(&[]), 0);
        assert_eq!(duration_seconds(&[msg(Speaker::User, "hi", 99.0)]), 0);
    }

    #[test]
    fn duration_never_negative() {
        let messages = vec![
            msg(Speaker::User, "a", 10.0),
            msg(Speaker::User, "b", 10.0),
        ];
        assert_eq!(duration_seconds(&messages), 0);
    }

    #[test]
    fn mmss_rendering() {
        assert_eq!(format_mmss(0), "0:00");
        assert_eq!(format_mmss(12), "0:12");
        assert_eq!(format_mmss(65), "1:05");
        assert_eq!(format_mmss(600), "10:00");
        assert_eq!(format_mmss(-3), "0:00");
    }

    #[test]
    fn transcript_uses_wire_speaker_names() {
        let messages = vec![
            msg(Speaker::User, "hi", 0.0),
            msg(Speaker::Assistant, "hello", 1.0),
        ];
        assert_eq!(render_transcript(&messages), "user: hi\nassistant: hello");
    }
}
