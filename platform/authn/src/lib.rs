//! Bearer-token identity.
//!
//! Tokens carry the subject id and nothing else. Roles are deliberately
//! absent from claims: the policy engine resolves them from the requester's
//! own `users` document on every request, so a stale or forged claim can
//! never widen access.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_minutes: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_minutes,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_token(uid: &str, config: &AuthConfig) -> Result<String, AuthnError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.token_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = IdentityClaims {
        sub: uid.to_string(),
        iat: now.timestamp() as usize,
        exp,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &config.encoding_key(),
    )?)
}

/// Verify a bearer token and return the subject id.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<String, AuthnError> {
    let data = jsonwebtoken::decode::<IdentityClaims>(
        token,
        &config.decoding_key(),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret", 30)
    }

    #[test]
    fn token_round_trips_subject() {
        let token = issue_token("client_789", &config()).unwrap();
        assert_eq!(verify_token(&token, &config()).unwrap(), "client_789");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token("client_789", &config()).unwrap();
        let other = AuthConfig::new("another-secret", 30);
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = AuthConfig::new("test-secret", -5);
        let token = issue_token("client_789", &expired).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }
}
