use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::user::User;

pub mod denylist;
pub mod password;

/// Both halves of the token pair are HS256 JWTs; the `kind` claim keeps an
/// access token from being replayed as a refresh token and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject -- the user's database id
    pub sub: i32,
    pub username: String,
    pub is_staff: bool,
    pub kind: TokenKind,
    /// Unique id, set on refresh tokens for revocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn access(user: &User) -> Self {
        let now = Utc::now();
        let expiry_mins = config::config().security.access_token_expiry_mins;
        Self {
            sub: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            kind: TokenKind::Access,
            jti: None,
            exp: (now + Duration::minutes(expiry_mins)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn refresh(user: &User) -> Self {
        let now = Utc::now();
        let expiry_days = config::config().security.refresh_token_expiry_days;
        Self {
            sub: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            kind: TokenKind::Refresh,
            jti: Some(Uuid::new_v4()),
            exp: (now + Duration::days(expiry_days)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Password hash error: {0}")]
    Hash(String),
}

/// Access/refresh pair handed out by register, login and refresh
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn generate_token_pair(user: &User) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: generate_jwt(&Claims::access(user))?,
        refresh: generate_jwt(&Claims::refresh(user))?,
    })
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a token's signature and expiry and check it is of the expected kind
pub fn decode_token(token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        }
    })?;

    if token_data.claims.kind != expected {
        return Err(AuthError::InvalidToken("wrong token kind".to_string()));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_user() -> User {
        User {
            id: 7,
            username: "spectra".to_string(),
            email: "spectra@monsterhigh.edu".to_string(),
            password_hash: String::new(),
            is_staff: true,
            first_name: None,
            last_name: None,
            date_joined: Utc.timestamp_opt(0, 0).unwrap(),
            last_login: None,
        }
    }

    fn with_secret<T>(f: impl FnOnce() -> T) -> T {
        std::env::set_var("JWT_SECRET", "test-secret-that-is-long-enough-for-hmac");
        f()
    }

    #[test]
    fn token_pair_round_trips() {
        with_secret(|| {
            let pair = generate_token_pair(&test_user()).unwrap();

            let access = decode_token(&pair.access, TokenKind::Access).unwrap();
            assert_eq!(access.sub, 7);
            assert_eq!(access.username, "spectra");
            assert!(access.is_staff);
            assert!(access.jti.is_none());

            let refresh = decode_token(&pair.refresh, TokenKind::Refresh).unwrap();
            assert_eq!(refresh.sub, 7);
            assert!(refresh.jti.is_some());
            assert!(refresh.exp > access.exp);
        });
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        with_secret(|| {
            let pair = generate_token_pair(&test_user()).unwrap();
            assert!(decode_token(&pair.access, TokenKind::Refresh).is_err());
            assert!(decode_token(&pair.refresh, TokenKind::Access).is_err());
        });
    }

    #[test]
    fn garbage_token_is_rejected() {
        with_secret(|| {
            let err = decode_token("not-a-jwt", TokenKind::Access).unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken(_)));
        });
    }
}
