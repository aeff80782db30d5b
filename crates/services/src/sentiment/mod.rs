use std::time::Duration;

use salesvoice_config::GeminiSettings;
use salesvoice_db::models::{Experience, Speaker, TranscriptEntry, Verdict};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Whole-conversation analysis is capped to the most recent characters to
/// bound prompt size.
const TRANSCRIPT_CHAR_CAP: usize = 3000;
const KEY_POINT_CAP: usize = 7;

#[derive(Debug, Error)]
enum ModelError {
    #[error("model call failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned no text")]
    Empty,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    // Absent on safety-blocked candidates; treated as an empty response.
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Terminal call summary produced at finalization.
#[derive(Debug, Clone)]
pub struct CallReport {
    pub summary: String,
    pub call_purpose: String,
    pub experience: Experience,
}

impl Default for CallReport {
    fn default() -> Self {
        Self {
            summary: String::new(),
            call_purpose: String::new(),
            experience: Experience::Neutral,
        }
    }
}

/// Adapter over the Gemini `generateContent` REST endpoint.
///
/// Every public method is a total function: model, network and parse
/// failures never cross this boundary. Callers cannot (and must not)
/// distinguish "classification failed" from "classification says neutral".
pub struct SentimentClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl SentimentClient {
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Per-utterance classification. Only called for customer speech.
    pub async fn classify(&self, text: &str) -> Verdict {
        let prompt = format!(
            r#"Analyze the customer's message:
"{text}"

Return strict JSON only:
{{
  "sentiment": "positive" | "neutral" | "negative",
  "confidence": 0..1,
  "key_points": ["point1", "point2"],
  "recommendation_to_salesperson": "short advice"
}}
"#
        );

        match self.generate(&self.settings.model, prompt).await {
            Ok(raw) => match parse_verdict(&raw) {
                Some(verdict) => verdict,
                None => {
                    warn!("Unparseable classification output, returning neutral fallback");
                    Verdict::neutral_fallback()
                }
            },
            Err(e) => {
                error!(error = %e, "Classification failed, returning neutral fallback");
                Verdict::neutral_fallback()
            }
        }
    }

    /// Whole-conversation analysis used by session save. Confidence is
    /// floored at 0.5 whenever the model responded; a deterministic
    /// fallback is produced when it did not.
    pub async fn summarize_conversation(&self, messages: &[TranscriptEntry]) -> Verdict {
        if messages.is_empty() {
            return Verdict {
                sentiment: "neutral".to_string(),
                confidence: 0.5,
                key_points: vec!["No conversation data".to_string()],
                recommendation: "No messages to analyze.".to_string(),
            };
        }

        let conversation = tail_chars(&render_conversation(messages), TRANSCRIPT_CHAR_CAP);
        info!(chars = conversation.len(), "Analyzing full conversation");

        let prompt = format!(
            r#"Analyze this complete sales conversation about AI/ML educational courses:

CONVERSATION:
{conversation}

Provide a comprehensive analysis in ONLY valid JSON format (no markdown, no code blocks):

{{
  "sentiment": "positive" OR "neutral" OR "negative",
  "confidence": 0.0 to 1.0,
  "key_points": ["point1", "point2", "point3"],
  "customer_interests": ["interest1", "interest2"],
  "customer_concerns": ["concern1", "concern2"],
  "recommendation_to_salesperson": "clear actionable recommendation"
}}

Analysis Guidelines:
- sentiment: "positive" if customer is interested/engaged, "negative" if explicitly rejecting/upset, "neutral" if undecided
- confidence: 0.8+ for clear sentiment, 0.5-0.7 for mixed signals
- key_points: 3-5 most important things from the ENTIRE conversation
- customer_interests: what did the customer ask about or show interest in?
- customer_concerns: what objections or hesitations did they express?
- recommendation: ONE specific action the salesperson should take next

IMPORTANT: Always provide at least 3 key points based on the conversation content.
"#
        );

        match self.generate(&self.settings.summary_model, prompt).await {
            Ok(raw) => match parse_conversation_verdict(&raw, messages) {
                Some(verdict) => verdict,
                None => {
                    warn!("Unparseable conversation analysis, using deterministic fallback");
                    conversation_fallback(messages)
                }
            },
            Err(e) => {
                error!(error = %e, "Conversation analysis failed, using deterministic fallback");
                conversation_fallback(messages)
            }
        }
    }

    /// Terminal summary for the Call Summary record. `experience` defaults
    /// to Neutral on any failure; a summary with empty narrative text is
    /// preferable to no summary at all.
    pub async fn summarize_call(&self, transcript: &str) -> CallReport {
        let prompt = format!(
            r#"Summarize this SALES CALL:
I want you to give the value of userExperience only as Positive, Neutral, or Negative based on the customer's tone and engagement..no other text.
{transcript}

Return ONLY JSON:
{{
  "summary": "",
  "callPurpose": "",
  "userExperience": ""
}}
"#
        );

        match self.generate(&self.settings.model, prompt).await {
            Ok(raw) => match parse_call_report(&raw) {
                Some(report) => report,
                None => {
                    warn!("Unparseable call summary output, using neutral report");
                    CallReport::default()
                }
            },
            Err(e) => {
                error!(error = %e, "Call summary failed, using neutral report");
                CallReport::default()
            }
        }
    }

    async fn generate(&self, model: &str, prompt: String) -> Result<String, ModelError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response: GenerateResponse = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(text)
    }
}

/// Renders messages as `Customer:`/`Agent:` transcript lines.
pub fn render_conversation(messages: &[TranscriptEntry]) -> String {
    messages
        .iter()
        .map(|m| {
            let role = match m.speaker {
                Speaker::User => "Customer",
                Speaker::Assistant => "Agent",
            };
            format!("{role}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps the final `cap` characters of `s` (char-boundary safe).
pub fn tail_chars(s: &str, cap: usize) -> String {
    let total = s.chars().count();
    if total <= cap {
        return s.to_string();
    }
    s.chars().skip(total - cap).collect()
}

/// Strips a surrounding markdown code fence (with optional `json` tag).
fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start();
        if let Some(tag) = text.get(..4) {
            if tag.eq_ignore_ascii_case("json") {
                text = &text[4..];
            }
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

#[derive(Deserialize)]
struct RawVerdict {
    sentiment: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    key_points: Vec<String>,
    recommendation_to_salesperson: Option<String>,
}

fn parse_verdict(raw: &str) -> Option<Verdict> {
    let parsed: RawVerdict = serde_json::from_str(&strip_code_fences(raw)).ok()?;
    Some(Verdict {
        sentiment: parsed
            .sentiment
            .unwrap_or_else(|| "neutral".to_string())
            .to_lowercase(),
        confidence: parsed.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        key_points: parsed.key_points,
        recommendation: parsed
            .recommendation_to_salesperson
            .unwrap_or_else(|| "Continue the conversation normally.".to_string()),
    })
}

#[derive(Deserialize)]
struct RawConversationVerdict {
    sentiment: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    customer_interests: Vec<String>,
    #[serde(default)]
    customer_concerns: Vec<String>,
    recommendation_to_salesperson: Option<String>,
}

fn parse_conversation_verdict(raw: &str, messages: &[TranscriptEntry]) -> Option<Verdict> {
    let parsed: RawConversationVerdict = serde_json::from_str(&strip_code_fences(raw)).ok()?;

    let mut key_points = parsed.key_points;
    key_points.extend(parsed.customer_interests);
    key_points.extend(parsed.customer_concerns);

    if key_points.is_empty() {
        key_points = user_excerpts(messages, 3, 80)
            .into_iter()
            .map(|t| format!("Customer message: {t}"))
            .collect();
        if key_points.is_empty() {
            key_points.push("Conversation completed".to_string());
        }
    }
    key_points.truncate(KEY_POINT_CAP);

    Some(Verdict {
        sentiment: parsed
            .sentiment
            .unwrap_or_else(|| "neutral".to_string())
            .to_lowercase(),
        // Floored: the model did respond, so "some analysis happened".
        confidence: parsed.confidence.unwrap_or(0.6).max(0.5),
        key_points,
        recommendation: parsed.recommendation_to_salesperson.unwrap_or_else(|| {
            "Follow up based on customer interests expressed in the conversation.".to_string()
        }),
    })
}

/// No-model fallback built purely from the messages, so the system never
/// returns an empty verdict when any messages exist.
fn conversation_fallback(messages: &[TranscriptEntry]) -> Verdict {
    let user_count = messages
        .iter()
        .filter(|m| m.speaker == Speaker::User)
        .count();

    let key_points = if user_count > 0 {
        user_excerpts(messages, 5, 100)
    } else {
        vec![
            format!("Conversation had {} total messages", messages.len()),
            format!("Customer spoke {user_count} times"),
            "See transcript for details".to_string(),
        ]
    };

    Verdict {
        sentiment: "neutral".to_string(),
        confidence: 0.5,
        key_points,
        recommendation: "Review the conversation transcript and follow up based on customer's responses.".to_string(),
    }
}

fn user_excerpts(messages: &[TranscriptEntry], count: usize, chars: usize) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.speaker == Speaker::User)
        .take(count)
        .map(|m| m.text.chars().take(chars).collect())
        .collect()
}

#[derive(Deserialize)]
struct RawCallReport {
    summary: Option<String>,
    #[serde(rename = "callPurpose")]
    call_purpose: Option<String>,
    #[serde(rename = "userExperience")]
    user_experience: Option<String>,
}

fn parse_call_report(raw: &str) -> Option<CallReport> {
    let parsed: RawCallReport = serde_json::from_str(&strip_code_fences(raw)).ok()?;
    Some(CallReport {
        summary: parsed.summary.unwrap_or_default(),
        call_purpose: parsed.call_purpose.unwrap_or_default(),
        experience: parsed
            .user_experience
            .and_then(|e| e.parse().ok())
            .unwrap_or(Experience::Neutral),
    })
}
