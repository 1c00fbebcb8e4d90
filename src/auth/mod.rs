pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

pub use password::{hash_password, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id,
            role: user.role.to_string(),
            center: user.center.clone(),
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Sign a session token for `user`
pub fn issue_token(user: &User, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let claims = Claims::for_user(user, security.jwt_expiry_hours);
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());

    encode(&Header::default(), &claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn decode_token(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default()).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid,
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 168,
            cors_origins: vec![],
        }
    }

    fn tutor() -> User {
        User::new(
            "Priya Sharma".to_string(),
            "priya@kalamfoundation.org",
            "hash".to_string(),
            Role::Tutor,
            Some("Delhi Center".to_string()),
        )
    }

    #[test]
    fn test_token_round_trip() {
        let user = tutor();
        let token = issue_token(&user, &security()).unwrap();
        let claims = decode_token(&token, &security()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "tutor");
        assert_eq!(claims.center.as_deref(), Some("Delhi Center"));
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(&tutor(), &security()).unwrap();
        let mut other = security();
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(decode_token(&token, &other), Err(JwtError::Invalid)));
        assert!(matches!(decode_token("garbage", &security()), Err(JwtError::Invalid)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user = tutor();
        let mut claims = Claims::for_user(&user, 1);
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(decode_token(&token, &security()), Err(JwtError::Expired)));
    }

    #[test]
    fn test_empty_secret_cannot_sign() {
        let mut config = security();
        config.jwt_secret.clear();
        assert!(matches!(issue_token(&tutor(), &config), Err(JwtError::InvalidSecret)));
    }
}
