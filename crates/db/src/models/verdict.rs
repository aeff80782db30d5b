use serde::{Deserialize, Serialize};

/// A sentiment classification result, either per-utterance or
/// whole-conversation. Advisory: held in a process-local cache and embedded
/// in session snapshots, never a collection of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub sentiment: String,
    pub confidence: f64,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(rename = "recommendation_to_salesperson")]
    pub recommendation: String,
}

impl Verdict {
    /// The classifier's total-function fallback: indistinguishable from a
    /// genuine neutral result by contract.
    pub fn neutral_fallback() -> Self {
        Self {
            sentiment: "neutral".to_string(),
            confidence: 0.0,
            key_points: Vec::new(),
            recommendation: "Unable to analyze.".to_string(),
        }
    }
}
