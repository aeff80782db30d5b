use axum::{Json, extract::State};
use salesvoice_db::models::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = state.auth.hash_password(&body.password)?;
    let user = state
        .users
        .create(
            body.email.to_lowercase(),
            password_hash,
            body.full_name,
            body.phone_number,
        )
        .await
        .map_err(|e| match e {
            salesvoice_services::dao::base::DaoError::DuplicateKey(_) => {
                ApiError::Conflict("Email already registered".to_string())
            }
            other => other.into(),
        })?;

    issue_token_response(&state, user)
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&body.email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !state.auth.verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    issue_token_response(&state, user)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid authentication".to_string()))?;

    Ok(Json(to_response(user)))
}

fn issue_token_response(state: &AppState, user: User) -> Result<Json<TokenResponse>, ApiError> {
    let id = user.id.map(|id| id.to_hex()).unwrap_or_default();
    let access_token = state.auth.issue_token(&id, &user.email)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: to_response(user),
    }))
}

fn to_response(u: User) -> UserResponse {
    UserResponse {
        id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: u.email,
        full_name: u.full_name,
        phone_number: u.phone_number,
        created_at: u.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}
