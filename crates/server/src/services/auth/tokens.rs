//! JWT access/refresh token minting and verification, plus the cookies that
//! transport them.
//!
//! Two independent HS256 secrets sign the two token kinds: a stolen refresh
//! secret must not validate access tokens and vice versa. Access tokens live
//! 15 minutes, refresh tokens 7 days, and the cookie max-ages match the token
//! lifetimes.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clover_core::UserId;

use crate::config::TokenConfig;

/// Access token lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime in seconds (7 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Name of the access token cookie.
pub const ACCESS_COOKIE: &str = "access_token";

/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Errors that can occur when verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token signature and structure are valid but the token has expired.
    ///
    /// Distinguished so the API can tell clients to attempt a refresh.
    #[error("token expired")]
    Expired,

    /// Token is malformed, has a bad signature, or failed to encode.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user ID.
    sub: i32,
    /// Expiry (unix seconds).
    exp: i64,
    /// Issued-at (unix seconds).
    iat: i64,
}

/// Mints and verifies the two token kinds and builds their cookies.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    secure_cookies: bool,
}

impl TokenService {
    /// Create a token service from config.
    #[must_use]
    pub fn new(config: &TokenConfig, secure_cookies: bool) -> Self {
        let access = config.access_secret.expose_secret().as_bytes();
        let refresh = config.refresh_secret.expose_secret().as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            secure_cookies,
        }
    }

    /// Mint a 15-minute access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if encoding fails.
    pub fn mint_access(&self, user_id: UserId) -> Result<String, TokenError> {
        mint(
            &self.access_encoding,
            user_id,
            Duration::seconds(ACCESS_TOKEN_TTL_SECS),
        )
    }

    /// Mint a 7-day refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if encoding fails.
    pub fn mint_refresh(&self, user_id: UserId) -> Result<String, TokenError> {
        mint(
            &self.refresh_encoding,
            user_id,
            Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        )
    }

    /// Verify an access token and extract the user ID.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for structurally valid but expired
    /// tokens, `TokenError::Invalid` otherwise.
    pub fn verify_access(&self, token: &str) -> Result<UserId, TokenError> {
        verify(&self.access_decoding, token)
    }

    /// Verify a refresh token and extract the user ID.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for structurally valid but expired
    /// tokens, `TokenError::Invalid` otherwise.
    pub fn verify_refresh(&self, token: &str) -> Result<UserId, TokenError> {
        verify(&self.refresh_decoding, token)
    }

    /// Build the access token cookie.
    #[must_use]
    pub fn access_cookie(&self, token: String) -> Cookie<'static> {
        self.auth_cookie(ACCESS_COOKIE, token, time::Duration::minutes(15))
    }

    /// Build the refresh token cookie.
    #[must_use]
    pub fn refresh_cookie(&self, token: String) -> Cookie<'static> {
        self.auth_cookie(REFRESH_COOKIE, token, time::Duration::days(7))
    }

    /// Build expired removal cookies for logout.
    #[must_use]
    pub fn removal_cookies(&self) -> (Cookie<'static>, Cookie<'static>) {
        (
            self.auth_cookie(ACCESS_COOKIE, String::new(), time::Duration::ZERO),
            self.auth_cookie(REFRESH_COOKIE, String::new(), time::Duration::ZERO),
        )
    }

    fn auth_cookie(&self, name: &'static str, value: String, max_age: time::Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

fn mint(key: &EncodingKey, user_id: UserId, ttl: Duration) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_i32(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(&Header::default(), &claims, key)?)
}

fn verify(key: &DecodingKey, token: &str) -> Result<UserId, TokenError> {
    let data = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256)).map_err(|e| {
        if matches!(e.kind(), ErrorKind::ExpiredSignature) {
            TokenError::Expired
        } else {
            TokenError::Invalid(e)
        }
    })?;

    Ok(UserId::new(data.claims.sub))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service() -> TokenService {
        TokenService::new(
            &TokenConfig {
                access_secret: SecretString::from("a".repeat(32)),
                refresh_secret: SecretString::from("b".repeat(32)),
            },
            false,
        )
    }

    #[test]
    fn test_access_roundtrip() {
        let svc = service();
        let token = svc.mint_access(UserId::new(42)).unwrap();
        assert_eq!(svc.verify_access(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_refresh_roundtrip() {
        let svc = service();
        let token = svc.mint_refresh(UserId::new(7)).unwrap();
        assert_eq!(svc.verify_refresh(&token).unwrap(), UserId::new(7));
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let svc = service();
        let refresh = svc.mint_refresh(UserId::new(1)).unwrap();
        assert!(matches!(
            svc.verify_access(&refresh),
            Err(TokenError::Invalid(_))
        ));

        let access = svc.mint_access(UserId::new(1)).unwrap();
        assert!(matches!(
            svc.verify_refresh(&access),
            Err(TokenError::Expired | TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let svc = service();
        // Mint a token that expired an hour ago (past the default leeway).
        let token = mint(
            &EncodingKey::from_secret("a".repeat(32).as_bytes()),
            UserId::new(3),
            Duration::hours(-1),
        )
        .unwrap();

        assert!(matches!(svc.verify_access(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let svc = service();
        assert!(matches!(
            svc.verify_access("not-a-jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let svc = service();
        let cookie = svc.access_cookie("tok".to_owned());
        assert_eq!(cookie.name(), "access_token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(15)));

        let secure_svc = TokenService::new(
            &TokenConfig {
                access_secret: SecretString::from("a".repeat(32)),
                refresh_secret: SecretString::from("b".repeat(32)),
            },
            true,
        );
        assert_eq!(secure_svc.refresh_cookie("tok".to_owned()).secure(), Some(true));
    }
}
