//! Coupon route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clover_core::CouponCode;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::coupons::CouponService;
use crate::state::AppState;

/// Validate-coupon request body.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Coupon response body.
#[derive(Serialize)]
pub struct CouponResponse {
    code: CouponCode,
    #[serde(rename = "discountPercentage")]
    discount_percentage: i32,
}

/// Validation response body.
#[derive(Serialize)]
pub struct ValidationResponse {
    message: &'static str,
    code: CouponCode,
    #[serde(rename = "discountPercentage")]
    discount_percentage: i32,
}

/// The caller's active coupon, or 404.
#[instrument(skip(state, user))]
pub async fn get_coupon(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CouponResponse>> {
    let coupon = CouponService::new(state.pool())
        .active_for_user(user.id)
        .await?;

    Ok(Json(CouponResponse {
        code: coupon.code,
        discount_percentage: coupon.discount_percent,
    }))
}

/// Validate a coupon code for the caller.
///
/// Expired coupons are rejected distinctly from unknown ones.
#[instrument(skip(state, user, body))]
pub async fn validate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ValidateCouponRequest>,
) -> Result<Json<ValidationResponse>> {
    let coupon = CouponService::new(state.pool())
        .validate(user.id, &body.code)
        .await?;

    Ok(Json(ValidationResponse {
        message: "Coupon is valid",
        code: coupon.code,
        discount_percentage: coupon.discount_percent,
    }))
}
