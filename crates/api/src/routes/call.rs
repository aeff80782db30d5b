use axum::{
    Json,
    extract::{Query, State},
};
use salesvoice_db::models::{CallSummary, Experience};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecentCallResponse {
    pub id: String,
    pub customer_name: String,
    pub sentiment: String,
    pub duration: String,
    pub rating: u8,
    pub call_date: String,
    pub summary: String,
    pub call_purpose: String,
    pub phone_number: Option<String>,
}

/// Recent call summaries for the authenticated user, newest first.
pub async fn recent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RecentQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let calls = state
        .summaries
        .recent_for_participant(&auth.user_id.to_hex(), limit)
        .await?;

    let items: Vec<RecentCallResponse> = calls.into_iter().map(to_recent_response).collect();
    Ok(Json(serde_json::json!({ "calls": items })))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_calls: u64,
    pub success_rate: u32,
    pub active_users: u32,
    pub avg_rating: f64,
}

/// Aggregate counters for the authenticated user's dashboard.
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state
        .summaries
        .stats_for_participant(&auth.user_id.to_hex())
        .await?;

    let (success_rate, avg_rating) = if stats.total_calls > 0 {
        let rate = (stats.positive_calls as f64 / stats.total_calls as f64 * 100.0).round() as u32;
        let neutral = stats.total_calls - stats.positive_calls - stats.negative_calls;
        let total_rating = 5 * stats.positive_calls + 3 * neutral + 2 * stats.negative_calls;
        let avg = (total_rating as f64 / stats.total_calls as f64 * 10.0).round() / 10.0;
        (rate, avg)
    } else {
        (0, 0.0)
    };

    Ok(Json(StatsResponse {
        total_calls: stats.total_calls,
        success_rate,
        // Single-user view.
        active_users: 1,
        avg_rating,
    }))
}

fn to_recent_response(c: CallSummary) -> RecentCallResponse {
    let sentiment = match c.experience {
        Experience::Positive => "Happy",
        Experience::Negative => "Upset",
        Experience::Neutral => "Neutral",
    };

    RecentCallResponse {
        id: c.session_id,
        customer_name: c
            .participant_name
            .or(c.participant_email)
            .unwrap_or_else(|| "Unknown".to_string()),
        sentiment: sentiment.to_string(),
        duration: c.duration.mmss,
        rating: c.experience.rating(),
        call_date: c.call_date.try_to_rfc3339_string().unwrap_or_default(),
        summary: c.summary,
        call_purpose: c.call_purpose,
        phone_number: c.phone_number,
    }
}
