//! Checkout/order flow.
//!
//! Session creation builds a hosted payment-gateway session from the client's
//! cart snapshot; confirmation retrieves the finalized session, burns the
//! coupon, and materializes exactly one order per session.
//!
//! The flow is a small state machine:
//!
//! ```text
//! Cart -> CheckoutSessionCreated -> PaymentConfirmed(Order)
//!                                |
//!                                -> PaymentRejected (no side effects)
//! ```
//!
//! Totals are computed from the client-supplied per-item prices, exactly as
//! the storefront sent them. The catalog of record is NOT consulted here; see
//! DESIGN.md for why this trust boundary is kept as-is.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use clover_core::{CouponCode, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{OrderRepository, RecordedOrder};
use crate::gateway::types::MetadataProduct;
use crate::gateway::{PaymentClient, PaymentError};
use crate::models::OrderItem;
use crate::services::coupons::{CouponError, CouponService};

/// Sessions whose discounted total reaches this (major units) also get a
/// one-time gateway-side discount object attached.
const GATEWAY_DISCOUNT_MIN_TOTAL: i64 = 20_000;

/// Sessions whose pre-discount total reaches this (major units) earn the
/// buyer a fresh gift coupon.
const GIFT_COUPON_MIN_TOTAL: i64 = 1_000;

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Empty or missing product list.
    #[error("invalid products array")]
    EmptyProducts,

    /// A supplied amount could not be converted to gateway minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The supplied coupon code did not validate for this user.
    #[error("invalid coupon code")]
    InvalidCoupon,

    /// Payment was not completed for the session.
    #[error("payment not completed")]
    NotPaid,

    /// The gateway session is missing or carries unusable metadata.
    #[error("malformed checkout session: {0}")]
    MalformedSession(String),

    /// Gateway call failed.
    #[error("payment gateway error: {0}")]
    Payment(#[from] PaymentError),

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One product in the checkout request, as sent by the storefront.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Response to a successful session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCheckoutSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: Decimal,
}

/// Result of confirming a paid session.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmedOrder {
    pub order: RecordedOrder,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    payments: &'a PaymentClient,
    client_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a PaymentClient, client_url: &'a str) -> Self {
        Self {
            pool,
            payments,
            client_url,
        }
    }

    /// Create a gateway checkout session for a cart snapshot.
    ///
    /// Side effect: a pre-discount total of at least
    /// [`GIFT_COUPON_MIN_TOTAL`] issues the buyer a fresh gift coupon while
    /// the session is still unpaid. See DESIGN.md for the trigger-point
    /// decision.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyProducts` for an empty list,
    /// `CheckoutError::InvalidCoupon` if a supplied code does not validate,
    /// and `CheckoutError::Payment` if the gateway rejects the session.
    #[instrument(skip(self, items))]
    pub async fn create_session(
        &self,
        user_id: UserId,
        items: Vec<CheckoutItem>,
        coupon_code: Option<&str>,
    ) -> Result<CreatedCheckoutSession, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyProducts);
        }

        let total = compute_total(&items);

        let coupons = CouponService::new(self.pool);
        let coupon = match coupon_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Some(self.validate_coupon(&coupons, user_id, code).await?),
            None => None,
        };

        let discounted_total = match &coupon {
            Some(c) => apply_discount(total, c.discount_percent),
            None => total,
        };

        // A big enough discounted total gets a one-time gateway coupon so the
        // hosted payment page charges the discounted amount.
        let gateway_coupon = match &coupon {
            Some(c) if discounted_total >= Decimal::from(GATEWAY_DISCOUNT_MIN_TOTAL) => {
                Some(self.payments.create_coupon(c.discount_percent).await?.id)
            }
            _ => None,
        };

        let metadata_products = serde_json::to_string(
            &items
                .iter()
                .map(|i| MetadataProduct {
                    id: i.id.as_i32(),
                    quantity: normalize_quantity(i.quantity),
                    price: i.price,
                })
                .collect::<Vec<_>>(),
        )
        .map_err(|e| CheckoutError::InvalidAmount(e.to_string()))?;

        let params = session_form_params(
            self.client_url,
            user_id,
            &items,
            coupon.as_ref().map(|c| &c.code),
            gateway_coupon.as_deref(),
            &metadata_products,
        )?;

        let session = self.payments.create_checkout_session(&params).await?;

        if total >= Decimal::from(GIFT_COUPON_MIN_TOTAL) {
            self.issue_gift_coupon(&coupons, user_id).await?;
        }

        info!(session = %session.id, %total, "created checkout session");

        Ok(CreatedCheckoutSession {
            session_id: session.id,
            total_amount: discounted_total,
        })
    }

    /// Confirm a paid session and materialize its order.
    ///
    /// Idempotent per session: confirming the same session again returns the
    /// order created the first time.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotPaid` (with no side effects) unless the
    /// gateway reports the session as paid, and
    /// `CheckoutError::MalformedSession` if session metadata cannot be
    /// reconciled into an order.
    #[instrument(skip(self))]
    pub async fn confirm(&self, session_id: &str) -> Result<ConfirmedOrder, CheckoutError> {
        let session = self.payments.retrieve_checkout_session(session_id).await?;

        if !session.payment_status.is_paid() {
            warn!(session = %session.id, status = %session.payment_status, "session not paid");
            return Err(CheckoutError::NotPaid);
        }

        let user_id: UserId = session
            .metadata
            .user_id
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| {
                CheckoutError::MalformedSession(format!(
                    "session {session_id} has no usable user_id"
                ))
            })?;

        // Burn the coupon that paid for the discount.
        if !session.metadata.coupon_code.is_empty() {
            let code = CouponCode::parse(&session.metadata.coupon_code).map_err(|e| {
                CheckoutError::MalformedSession(format!("bad coupon code in metadata: {e}"))
            })?;
            match CouponService::new(self.pool).deactivate(user_id, &code).await {
                Ok(()) => {}
                Err(CouponError::Repository(e)) => return Err(CheckoutError::Repository(e)),
                Err(e) => {
                    return Err(CheckoutError::MalformedSession(format!(
                        "coupon deactivation failed: {e}"
                    )));
                }
            }
        }

        // Line items are rebuilt from the metadata snapshot, with the gateway
        // line items contributing the display-name snapshot.
        let products: Vec<MetadataProduct> = serde_json::from_str(&session.metadata.products)
            .map_err(|e| {
                CheckoutError::MalformedSession(format!("bad product metadata: {e}"))
            })?;

        let line_items = self.payments.list_line_items(session_id).await?;

        let items: Vec<OrderItem> = products
            .iter()
            .enumerate()
            .map(|(idx, p)| OrderItem {
                product_id: ProductId::new(p.id),
                name: line_items
                    .get(idx)
                    .map(|l| l.description.clone())
                    .unwrap_or_default(),
                quantity: p.quantity,
                unit_price: p.price,
            })
            .collect();

        let total_amount = Decimal::new(session.amount_total, 2);

        let order = OrderRepository::new(self.pool)
            .record(
                user_id,
                total_amount,
                &session.id,
                session.payment_status,
                &items,
            )
            .await?;

        if order.newly_created {
            info!(order = %order.order_id, session = %session.id, "order created");
        } else {
            info!(order = %order.order_id, session = %session.id, "session already confirmed");
        }

        Ok(ConfirmedOrder { order })
    }

    async fn validate_coupon(
        &self,
        coupons: &CouponService<'a>,
        user_id: UserId,
        code: &str,
    ) -> Result<crate::models::Coupon, CheckoutError> {
        coupons.validate(user_id, code).await.map_err(|e| match e {
            CouponError::Repository(e) => CheckoutError::Repository(e),
            CouponError::NotFound | CouponError::Expired | CouponError::InvalidCode(_) => {
                CheckoutError::InvalidCoupon
            }
        })
    }

    async fn issue_gift_coupon(
        &self,
        coupons: &CouponService<'a>,
        user_id: UserId,
    ) -> Result<(), CheckoutError> {
        match coupons.issue_gift(user_id).await {
            Ok(_) => Ok(()),
            Err(CouponError::Repository(e)) => Err(CheckoutError::Repository(e)),
            // issue_gift only fails on repository errors
            Err(e) => Err(CheckoutError::MalformedSession(e.to_string())),
        }
    }
}

/// Sum of client-supplied price x quantity across all items, in major units.
fn compute_total(items: &[CheckoutItem]) -> Decimal {
    items
        .iter()
        .map(|i| i.price * Decimal::from(normalize_quantity(i.quantity)))
        .sum()
}

/// Apply a percentage discount, rounded to cents.
fn apply_discount(total: Decimal, percent: i32) -> Decimal {
    let discount = (total * Decimal::from(percent) / Decimal::from(100)).round_dp(2);
    total - discount
}

/// Coerce a client-supplied quantity to a positive integer, defaulting to 1.
fn normalize_quantity(quantity: Option<i64>) -> i32 {
    match quantity {
        Some(q) if q >= 1 => i32::try_from(q).unwrap_or(i32::MAX),
        _ => 1,
    }
}

/// Convert a major-unit amount to gateway minor units.
fn to_minor_units(amount: Decimal) -> Result<i64, CheckoutError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| CheckoutError::InvalidAmount(format!("amount {amount} out of range")))
}

/// Build the form parameters for a gateway checkout session.
fn session_form_params(
    client_url: &str,
    user_id: UserId,
    items: &[CheckoutItem],
    coupon_code: Option<&CouponCode>,
    gateway_coupon: Option<&str>,
    metadata_products: &str,
) -> Result<Vec<(String, String)>, CheckoutError> {
    let client_url = client_url.trim_end_matches('/');

    let mut params = vec![
        ("mode".to_owned(), "payment".to_owned()),
        (
            "payment_method_types[0]".to_owned(),
            "card".to_owned(),
        ),
        (
            "success_url".to_owned(),
            format!("{client_url}/purchase-success?session_id={{CHECKOUT_SESSION_ID}}"),
        ),
        (
            "cancel_url".to_owned(),
            format!("{client_url}/purchase-cancel"),
        ),
    ];

    for (idx, item) in items.iter().enumerate() {
        let quantity = normalize_quantity(item.quantity);
        params.push((
            format!("line_items[{idx}][quantity]"),
            quantity.to_string(),
        ));
        params.push((
            format!("line_items[{idx}][price_data][currency]"),
            "usd".to_owned(),
        ));
        params.push((
            format!("line_items[{idx}][price_data][unit_amount]"),
            to_minor_units(item.price)?.to_string(),
        ));
        params.push((
            format!("line_items[{idx}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(image) = &item.image {
            params.push((
                format!("line_items[{idx}][price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
    }

    if let Some(coupon) = gateway_coupon {
        params.push(("discounts[0][coupon]".to_owned(), coupon.to_owned()));
    }

    params.push(("metadata[user_id]".to_owned(), user_id.to_string()));
    params.push((
        "metadata[coupon_code]".to_owned(),
        coupon_code.map(ToString::to_string).unwrap_or_default(),
    ));
    params.push((
        "metadata[products]".to_owned(),
        metadata_products.to_owned(),
    ));

    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(price: &str, quantity: Option<i64>) -> CheckoutItem {
        CheckoutItem {
            id: ProductId::new(1),
            name: "Ceramic Mug".to_owned(),
            image: None,
            price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_normalize_quantity() {
        assert_eq!(normalize_quantity(None), 1);
        assert_eq!(normalize_quantity(Some(0)), 1);
        assert_eq!(normalize_quantity(Some(-3)), 1);
        assert_eq!(normalize_quantity(Some(5)), 5);
    }

    #[test]
    fn test_compute_total() {
        let items = vec![item("150.00", Some(2)), item("49.99", None)];
        assert_eq!(compute_total(&items), "349.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_apply_discount_rounds_to_cents() {
        let total = "349.99".parse::<Decimal>().unwrap();
        // 10% of 349.99 = 35.00 after rounding; discounted total 314.99
        assert_eq!(
            apply_discount(total, 10),
            "314.99".parse::<Decimal>().unwrap()
        );
        assert_eq!(apply_discount(total, 0), total);
        assert_eq!(apply_discount(total, 100), Decimal::ZERO);
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units("19.99".parse().unwrap()).unwrap(), 1999);
        assert_eq!(to_minor_units("0.005".parse().unwrap()).unwrap(), 1);
    }

    #[test]
    fn test_session_form_params_shape() {
        let items = vec![item("150.00", Some(2))];
        let code = CouponCode::parse("GIFTAAAAAA").unwrap();
        let params = session_form_params(
            "http://localhost:5173/",
            UserId::new(7),
            &items,
            Some(&code),
            Some("gw_coupon_1"),
            "[]",
        )
        .unwrap();

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("mode"), "payment");
        assert_eq!(
            get("success_url"),
            "http://localhost:5173/purchase-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(get("line_items[0][quantity]"), "2");
        assert_eq!(get("line_items[0][price_data][unit_amount]"), "15000");
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            "Ceramic Mug"
        );
        assert_eq!(get("discounts[0][coupon]"), "gw_coupon_1");
        assert_eq!(get("metadata[user_id]"), "7");
        assert_eq!(get("metadata[coupon_code]"), "GIFTAAAAAA");
    }

    #[test]
    fn test_session_form_params_without_coupon() {
        let items = vec![item("20.00", None)];
        let params =
            session_form_params("http://shop.test", UserId::new(2), &items, None, None, "[]")
                .unwrap();

        assert!(!params.iter().any(|(k, _)| k.starts_with("discounts")));
        let coupon_meta = params
            .iter()
            .find(|(k, _)| k == "metadata[coupon_code]")
            .map(|(_, v)| v.as_str())
            .unwrap();
        assert_eq!(coupon_meta, "");
    }
}
