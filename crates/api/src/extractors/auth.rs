use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use bson::oid::ObjectId;

use crate::{error::ApiError, state::AppState};

/// Bearer-token authenticated caller.
pub struct AuthUser {
    pub user_id: ObjectId,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected bearer token".to_string()))?;

        let claims = state.auth.decode_token(token)?;
        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}
