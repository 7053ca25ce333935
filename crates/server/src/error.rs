//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses are JSON `{"message": ...}` bodies; the
//! expired-access-token rejection additionally carries a machine-readable
//! `code` so clients know to attempt a refresh.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::gateway::PaymentError;
use crate::services::analytics::AnalyticsError;
use crate::services::auth::{AuthError, TokenError, TokenStoreError};
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutError;
use crate::services::coupons::CouponError;
use crate::services::images::ImageError;

/// Error code attached to 401 responses for expired access tokens, so the
/// client can attempt a refresh exactly once.
pub const CODE_ACCESS_TOKEN_EXPIRED: &str = "ACCESS_TOKEN_EXPIRED";

/// Error code attached to expired-coupon rejections.
pub const CODE_COUPON_EXPIRED: &str = "COUPON_EXPIRED";

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Token verification failed (signature/structure).
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// The access token is valid but expired.
    #[error("Access token expired")]
    AccessTokenExpired,

    /// Refresh token store operation failed.
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    /// Coupon operation failed.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Analytics operation failed.
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::TokenStore(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::EmptyName => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Token(_) | Self::AccessTokenExpired | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Coupon(err) => match err {
                CouponError::NotFound => StatusCode::NOT_FOUND,
                CouponError::Expired | CouponError::InvalidCode(_) => StatusCode::BAD_REQUEST,
                CouponError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyProducts
                | CheckoutError::InvalidAmount(_)
                | CheckoutError::InvalidCoupon
                | CheckoutError::NotPaid => StatusCode::BAD_REQUEST,
                CheckoutError::Payment(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::MalformedSession(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound => StatusCode::NOT_FOUND,
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::Image(_) => StatusCode::BAD_GATEWAY,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Analytics(err) => match err {
                AnalyticsError::InvalidRange => StatusCode::BAD_REQUEST,
                AnalyticsError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Server-class errors are not leaked.
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::TokenStore(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid email or password".to_string()
                }
                AuthError::UserAlreadyExists => "User already exists".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::EmptyName => "Name cannot be empty".to_string(),
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Token(_) => "Invalid access token".to_string(),
            Self::AccessTokenExpired => "Access token expired".to_string(),
            Self::Coupon(err) => match err {
                CouponError::NotFound => "Coupon not found".to_string(),
                CouponError::Expired => "Coupon has expired".to_string(),
                CouponError::InvalidCode(e) => e.to_string(),
                CouponError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyProducts => "Invalid products array".to_string(),
                CheckoutError::InvalidAmount(msg) => msg.clone(),
                CheckoutError::InvalidCoupon => "Invalid coupon code".to_string(),
                CheckoutError::NotPaid => "Payment not completed".to_string(),
                CheckoutError::Payment(_) => "Payment gateway error".to_string(),
                CheckoutError::MalformedSession(_) | CheckoutError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound => "Product not found".to_string(),
                CatalogError::Validation(msg) => msg.clone(),
                CatalogError::Image(_) => "Image host error".to_string(),
                CatalogError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Analytics(err) => match err {
                AnalyticsError::InvalidRange => "Invalid date range".to_string(),
                AnalyticsError::Repository(_) => "Internal server error".to_string(),
            },
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg.clone(),
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            Self::AccessTokenExpired => Some(CODE_ACCESS_TOKEN_EXPIRED),
            Self::Coupon(CouponError::Expired) => Some(CODE_COUPON_EXPIRED),
            _ => None,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
            || matches!(
                self,
                Self::Checkout(CheckoutError::Payment(_)) | Self::Catalog(CatalogError::Image(_))
            )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            message: self.message(),
            code: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        Self::Checkout(CheckoutError::Payment(e))
    }
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        Self::Catalog(CatalogError::Image(e))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::AccessTokenExpired),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::WeakPassword("short".into()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_coupon_error_mapping() {
        assert_eq!(
            status_of(AppError::Coupon(CouponError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Coupon(CouponError::Expired)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_expired_access_token_carries_code() {
        assert_eq!(
            AppError::AccessTokenExpired.code(),
            Some(CODE_ACCESS_TOKEN_EXPIRED)
        );
        assert_eq!(AppError::Unauthorized("x".into()).code(), None);
    }

    #[test]
    fn test_checkout_error_mapping() {
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::EmptyProducts)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::NotPaid)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_messages_are_not_leaked() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.message(), "Internal server error");
    }
}
