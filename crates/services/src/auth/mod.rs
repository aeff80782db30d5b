use argon2::Argon2;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use salesvoice_config::AuthSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Hash error: {0}")]
    HashError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (ObjectId hex).
    pub sub: String,
    pub email: String,
    pub exp: i64,
}

pub struct AuthService {
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(settings: AuthSettings) -> Self {
        Self { settings }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn issue_token(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let exp = chrono::Utc::now() + chrono::Duration::minutes(self.settings.token_ttl_minutes);
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthSettings {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
        })
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let auth = service();
        let hash = auth.hash_password("s3cret").unwrap();
        assert!(auth.verify_password("s3cret", &hash));
        assert!(!auth.verify_password("wrong", &hash));
        assert!(!auth.verify_password("s3cret", "not-a-phc-string"));
    }

    #[test]
    fn token_roundtrip_carries_identity() {
        let auth = service();
        let token = auth.issue_token("65f0aa", "a@b.com").unwrap();
        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "65f0aa");
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let auth = service();
        assert!(matches!(
            auth.decode_token("garbage"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
