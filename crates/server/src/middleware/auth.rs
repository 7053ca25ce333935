//! Authentication extractors.
//!
//! Route handlers request [`CurrentUser`] (any signed-in user) or
//! [`RequireAdmin`] (admin role) as extractor arguments. The extractor reads
//! the `access_token` cookie, verifies the JWT, and loads the referenced
//! user. A structurally valid but expired token is rejected with the
//! distinguished expired-token 401 so clients refresh and retry once.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::services::auth::tokens::ACCESS_COOKIE;
use crate::services::auth::{AuthError, AuthService, TokenError};
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or_else(|| AppError::Unauthorized("No access token provided".to_owned()))?;

        let user_id = state.tokens().verify_access(&token).map_err(|e| match e {
            TokenError::Expired => AppError::AccessTokenExpired,
            TokenError::Invalid(_) => {
                AppError::Unauthorized("Invalid access token".to_owned())
            }
        })?;

        // A token can outlive its user; reject if the account is gone.
        let user = AuthService::new(state.pool())
            .get_user(user_id)
            .await
            .map_err(|e| match e {
                AuthError::UserNotFound => {
                    AppError::Unauthorized("No user found for token".to_owned())
                }
                other => AppError::Auth(other),
            })?;

        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated admin user.
///
/// Rejects non-admin users with 403.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Access denied - admin only".to_owned()));
        }

        Ok(Self(user))
    }
}
