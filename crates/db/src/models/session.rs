use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::{Speaker, Verdict};

/// One message inside a session snapshot. Embedded copy of the buffered
/// utterance, without a document id of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub sent_ts: f64,
    pub received_at: DateTime,
}

/// Durable snapshot of a session's transcript, upserted by `session_id`.
/// May be written many times before finalization; each save overwrites the
/// previous snapshot for that id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<TranscriptEntry>,
    #[serde(default)]
    pub total_messages: u32,
    pub latest_analysis: Option<Verdict>,
    pub saved_at: DateTime,
}

impl SessionRecord {
    pub const COLLECTION: &'static str = "sessions";
}
