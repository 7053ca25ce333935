//! Client error types.

use thiserror::Error;

/// Errors returned by the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
        /// Machine-readable error code, when the server sent one.
        code: Option<String>,
    },

    /// The session could not be refreshed; the user must log in again.
    #[error("session expired")]
    SessionExpired,
}

impl ClientError {
    /// Whether this error is the distinguished expired-access-token 401.
    #[must_use]
    pub fn is_access_token_expired(&self) -> bool {
        matches!(
            self,
            Self::Api { status: 401, code: Some(code), .. }
                if code == crate::ACCESS_TOKEN_EXPIRED_CODE
        )
    }
}
