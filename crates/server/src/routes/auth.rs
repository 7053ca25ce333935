//! Auth route handlers.
//!
//! Successful signup/login mint an access + refresh token pair, persist the
//! refresh token, and transport both as http-only same-site cookies.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clover_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::user::PublicUser;
use crate::services::auth::AuthService;
use crate::services::auth::tokens::REFRESH_COOKIE;
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body carrying the public user.
#[derive(Serialize)]
struct AuthResponse {
    user: PublicUser,
    message: &'static str,
}

/// Plain message response.
#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Refresh response carrying the new access token.
#[derive(Serialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    message: &'static str,
}

/// Mint both tokens for a user, persist the refresh token, and add the auth
/// cookies to the jar.
async fn start_session(state: &AppState, jar: CookieJar, user_id: UserId) -> Result<CookieJar> {
    let access = state
        .tokens()
        .mint_access(user_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let refresh = state
        .tokens()
        .mint_refresh(user_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    state.token_store().save(user_id, &refresh).await?;

    Ok(jar
        .add(state.tokens().access_cookie(access))
        .add(state.tokens().refresh_cookie(refresh)))
}

/// Create an account.
#[instrument(skip(state, jar, body))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .signup(&body.name, &body.email, &body.password)
        .await?;

    let jar = start_session(&state, jar, user.id).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: user.public(),
            message: "User created successfully",
        }),
    ))
}

/// Login with email and password.
#[instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let jar = start_session(&state, jar, user.id).await?;

    Ok((
        jar,
        Json(AuthResponse {
            user: user.public(),
            message: "Login successful",
        }),
    ))
}

/// Logout: drop the stored refresh token and clear both cookies.
///
/// Tolerates missing or invalid refresh cookies; logout always succeeds.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE)
        && let Ok(user_id) = state.tokens().verify_refresh(cookie.value())
    {
        state.token_store().delete(user_id).await?;
    }

    let (access_removal, refresh_removal) = state.tokens().removal_cookies();
    let jar = jar.add(access_removal).add(refresh_removal);

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

/// Mint a new access token from a valid refresh token.
///
/// The refresh token must match the stored value for the user; the refresh
/// token itself is left unchanged.
#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(|| AppError::Unauthorized("No refresh token provided".to_owned()))?;

    let user_id = state
        .tokens()
        .verify_refresh(&token)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_owned()))?;

    let stored = state
        .token_store()
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Refresh token expired".to_owned()))?;

    if stored != token {
        return Err(AppError::Forbidden("Refresh token mismatch".to_owned()));
    }

    let access = state
        .tokens()
        .mint_access(user_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let jar = jar.add(state.tokens().access_cookie(access.clone()));

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: access,
            message: "Access token refreshed successfully",
        }),
    ))
}

/// Current user profile.
#[instrument(skip(user))]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.public())
}
