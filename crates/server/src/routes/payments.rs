//! Payment route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clover_core::OrderId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::checkout::{CheckoutItem, CheckoutService, CreatedCheckoutSession};
use crate::state::AppState;

/// Create-session request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub products: Vec<CheckoutItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Checkout-success request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSuccessRequest {
    pub session_id: String,
}

/// Checkout-success response body.
#[derive(Serialize)]
pub struct CheckoutSuccessResponse {
    success: bool,
    #[serde(rename = "orderId")]
    order_id: OrderId,
    message: &'static str,
}

fn checkout(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(state.pool(), state.payments(), &state.config().client_url)
}

/// Create a gateway checkout session from the client's cart snapshot.
#[instrument(skip(state, user, body))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreatedCheckoutSession>> {
    let session = checkout(&state)
        .create_session(user.id, body.products, body.coupon_code.as_deref())
        .await?;

    Ok(Json(session))
}

/// Confirm a paid session: burn the coupon and record the order.
///
/// Confirming the same session twice returns the order created the first
/// time instead of duplicating it.
#[instrument(skip(state, _user, body))]
pub async fn checkout_success(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(body): Json<CheckoutSuccessRequest>,
) -> Result<Json<CheckoutSuccessResponse>> {
    let confirmed = checkout(&state).confirm(&body.session_id).await?;

    Ok(Json(CheckoutSuccessResponse {
        success: true,
        order_id: confirmed.order.order_id,
        message: "Payment successful, order created, coupon deactivated",
    }))
}
