//! Refresh token store backed by redis.
//!
//! One refresh token per user, keyed `refresh_token:{user_id}`, expiring with
//! the token itself (`SET .. EX`). Login and signup overwrite the previous
//! value, so older refresh tokens stop validating immediately.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use clover_core::UserId;

use super::tokens::REFRESH_TOKEN_TTL_SECS;

/// Errors from the refresh token store.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Redis command or connection failure.
    #[error("token store error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Refresh token store, cheap to clone (multiplexed connection).
#[derive(Clone)]
pub struct RefreshTokenStore {
    conn: ConnectionManager,
}

impl RefreshTokenStore {
    /// Connect to redis.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError::Redis` if the connection cannot be
    /// established.
    pub async fn connect(redis_url: &SecretString) -> Result<Self, TokenStoreError> {
        let client = redis::Client::open(redis_url.expose_secret())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }

    /// Store the user's current refresh token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError::Redis` if the command fails.
    pub async fn save(&self, user_id: UserId, token: &str) -> Result<(), TokenStoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::key(user_id), token, REFRESH_TOKEN_TTL_SECS.unsigned_abs())
            .await?;

        Ok(())
    }

    /// Get the user's stored refresh token, if one exists and has not
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError::Redis` if the command fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<String>, TokenStoreError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = conn.get(Self::key(user_id)).await?;

        Ok(token)
    }

    /// Delete the user's stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError::Redis` if the command fails.
    pub async fn delete(&self, user_id: UserId) -> Result<(), TokenStoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(user_id)).await?;

        Ok(())
    }

    fn key(user_id: UserId) -> String {
        format!("refresh_token:{user_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(RefreshTokenStore::key(UserId::new(42)), "refresh_token:42");
    }
}
