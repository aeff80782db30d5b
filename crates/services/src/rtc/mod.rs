use jsonwebtoken::{EncodingKey, Header, encode};
use salesvoice_config::RtcSettings;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtcError {
    #[error("RTC credentials not configured")]
    NotConfigured,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Everything a browser client needs to join its call room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomAccess {
    pub token: String,
    pub url: String,
    pub room: String,
    pub user_id: String,
}

#[derive(Serialize)]
struct VideoGrant {
    room: String,
    #[serde(rename = "roomJoin")]
    room_join: bool,
    #[serde(rename = "canPublish")]
    can_publish: bool,
    #[serde(rename = "canSubscribe")]
    can_subscribe: bool,
}

#[derive(Serialize)]
struct RoomClaims {
    iss: String,
    sub: String,
    name: String,
    nbf: i64,
    exp: i64,
    video: VideoGrant,
}

/// Issues HS256 room-join tokens for the realtime voice platform.
///
/// The room id handed out is the requested name decorated with the
/// participant's user id (`{room}-user-{id}`); the agent worker later
/// recovers the id from that suffix, and the backend's durable lookups
/// prefix-match against the undecorated name.
pub struct RtcTokenService {
    settings: RtcSettings,
}

impl RtcTokenService {
    pub fn new(settings: RtcSettings) -> Self {
        Self { settings }
    }

    pub fn issue(
        &self,
        room_name: &str,
        participant_name: &str,
        user_id: Option<String>,
    ) -> Result<RoomAccess, RtcError> {
        if self.settings.api_key.is_empty() || self.settings.api_secret.is_empty() {
            return Err(RtcError::NotConfigured);
        }

        let user_id =
            user_id.unwrap_or_else(|| format!("user_{}", uuid::Uuid::new_v4().simple()));
        let room = format!("{room_name}-user-{user_id}");

        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::minutes(self.settings.token_ttl_minutes);
        let claims = RoomClaims {
            iss: self.settings.api_key.clone(),
            sub: participant_name.to_string(),
            name: participant_name.to_string(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            video: VideoGrant {
                room: room.clone(),
                room_join: true,
                can_publish: true,
                can_subscribe: true,
            },
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.api_secret.as_bytes()),
        )
        .map_err(|e| RtcError::Signing(e.to_string()))?;

        Ok(RoomAccess {
            token,
            url: self.settings.ws_url.clone(),
            room,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RtcSettings {
        RtcSettings {
            api_key: "devkey".to_string(),
            api_secret: "devsecret".to_string(),
            ws_url: "ws://localhost:7880".to_string(),
            token_ttl_minutes: 360,
        }
    }

    #[test]
    fn decorates_room_with_user_suffix() {
        let svc = RtcTokenService::new(settings());
        let access = svc
            .issue("sales-room", "Alice", Some("65f0".to_string()))
            .unwrap();
        assert_eq!(access.room, "sales-room-user-65f0");
        assert_eq!(access.user_id, "65f0");
        assert!(!access.token.is_empty());
    }

    #[test]
    fn generates_user_id_when_absent() {
        let svc = RtcTokenService::new(settings());
        let access = svc.issue("sales-room", "Alice", None).unwrap();
        assert!(access.user_id.starts_with("user_"));
        assert!(access.room.starts_with("sales-room-user-user_"));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let svc = RtcTokenService::new(RtcSettings {
            api_key: String::new(),
            api_secret: String::new(),
            ws_url: "ws://localhost:7880".to_string(),
            token_ttl_minutes: 360,
        });
        assert!(matches!(
            svc.issue("r", "p", None),
            Err(RtcError::NotConfigured)
        ));
    }
}
