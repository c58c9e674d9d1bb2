//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub` and an absolute expiry
//! in `exp`. Verification uses zero leeway and treats `exp <= now` as expired.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::models::auth::AuthToken;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    iat: i64,
    exp: i64,
}

/// Token errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token generation failed: {0}")]
    Signing(String),
}

/// Issues a signed token for `user_id` that expires `ttl` from now
pub fn issue(user_id: i64, secret: &str, ttl: Duration) -> Result<AuthToken, TokenError> {
    issue_at(user_id, secret, ttl, Utc::now())
}

fn issue_at(
    user_id: i64,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<AuthToken, TokenError> {
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing(format!("token lifetime {} is out of range", ttl)))?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))?;

    Ok(AuthToken { token, expires_at })
}

/// Verifies signature and expiry, returning the embedded user id
pub fn verify(token: &str, secret: &str) -> Result<i64, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    // jsonwebtoken still accepts exp == now
    if token_data.claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| TokenError::Invalid)
}

/// Issuer bound to the configured secret and ttl
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self::new(settings.secret.clone(), settings.ttl())
    }

    pub fn issue(&self, user_id: i64) -> Result<AuthToken, TokenError> {
        issue(user_id, &self.secret, self.ttl)
    }

    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        verify(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";

    #[test]
    fn test_issue_then_verify_returns_user_id() {
        let token = issue(42, SECRET, Duration::hours(1)).unwrap();
        assert_eq!(verify(&token.token, SECRET), Ok(42));
    }

    #[test]
    fn test_token_is_a_three_part_jwt() {
        let token = issue(1, SECRET, Duration::minutes(5)).unwrap();
        let parts: Vec<&str> = token.token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");
        assert!(parts.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_expiry_is_now_plus_ttl() {
        let before = Utc::now();
        let token = issue(1, SECRET, Duration::hours(24)).unwrap();
        let diff = (token.expires_at - (before + Duration::hours(24)))
            .num_seconds()
            .abs();
        assert!(diff < 5, "expiry drifted by {} seconds", diff);
    }

    #[test]
    fn test_zero_ttl_is_rejected_immediately() {
        let token = issue(7, SECRET, Duration::zero()).unwrap();
        assert_eq!(verify(&token.token, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn test_past_expiry_is_rejected() {
        let issued = issue_at(7, SECRET, Duration::minutes(1), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(verify(&issued.token, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let ttl = Duration::try_seconds(1_000_000_000_000_000).unwrap();
        assert!(matches!(issue(1, SECRET, ttl), Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue(7, "secret1", Duration::hours(1)).unwrap();
        assert_eq!(verify(&token.token, "secret2"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        for token in ["not.a.token", "invalid", "", "header.payload", "a.b.c.d"] {
            assert_eq!(
                verify(token, SECRET),
                Err(TokenError::Invalid),
                "malformed token '{}' should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_non_numeric_subject_is_rejected() {
        let claims = Claims {
            sub: "alice".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(&token, SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn test_service_uses_configured_ttl() {
        let service = TokenService::new(SECRET, Duration::zero());
        let token = service.issue(3).unwrap();
        assert_eq!(service.verify(&token.token), Err(TokenError::Expired));
    }
}
