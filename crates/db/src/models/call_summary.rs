use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Overall customer experience for a finished call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
    Positive,
    Neutral,
    Negative,
}

impl Experience {
    /// 1-5 star rating used by the dashboard views.
    pub fn rating(&self) -> u8 {
        match self {
            Experience::Positive => 5,
            Experience::Neutral => 3,
            Experience::Negative => 2,
        }
    }
}

impl std::str::FromStr for Experience {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Experience::Positive),
            "negative" => Ok(Experience::Negative),
            "neutral" => Ok(Experience::Neutral),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDuration {
    pub seconds: i64,
    pub mmss: String,
}

/// The one-per-session terminal record produced by finalization.
/// Uniqueness on `session_id` is enforced by an index (see `indexes.rs`);
/// that index, not application logic, is what makes concurrent finalize
/// attempts collapse to a single row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSummary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub session_id: String,
    pub participant_id: String,
    pub participant_email: Option<String>,
    pub participant_name: Option<String>,
    pub phone_number: Option<String>,
    pub summary: String,
    pub call_purpose: String,
    pub experience: Experience,
    pub duration: CallDuration,
    #[serde(default)]
    pub total_messages: u32,
    pub call_date: DateTime,
    pub created_at: DateTime,
}

impl CallSummary {
    pub const COLLECTION: &'static str = "call_summaries";
}
