use axum::{Json, extract::State};
use salesvoice_services::rtc::RoomAccess;
use serde::Deserialize;
use validator::Validate;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub room_name: String,
    #[validate(length(min = 1))]
    pub participant_name: String,
    pub user_id: Option<String>,
}

pub async fn create_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<RoomAccess>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let access = state
        .rtc
        .issue(&body.room_name, &body.participant_name, body.user_id)?;
    Ok(Json(access))
}
