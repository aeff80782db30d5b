use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Who produced a transcribed turn of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcribed turn of speech, mirrored from the in-memory buffer.
/// Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub session_id: String,
    pub speaker: Speaker,
    pub text: String,
    /// Sender-side timestamp (unix seconds). Defines conversation ordering
    /// and call duration; arrival order at this process may differ.
    pub sent_ts: f64,
    pub received_at: DateTime,
}

impl Utterance {
    pub const COLLECTION: &'static str = "utterances";
}
