//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use clover_core::{OrderId, PaymentStatus, ProductId, UserId};

/// A confirmed order.
///
/// Created exactly once per paid checkout session and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Buying user.
    pub user_id: UserId,
    /// Total charged amount in major units.
    pub total_amount: Decimal,
    /// External payment-session identifier. Unique across all orders.
    pub checkout_session_id: String,
    /// Payment status reported by the gateway at confirmation time.
    pub payment_status: PaymentStatus,
    /// When the order was recorded.
    pub created_at: DateTime<Utc>,
}

/// A purchased line item, snapshotted at purchase time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Product that was purchased. Not a foreign key: the product may be
    /// deleted from the catalog later without touching the order.
    pub product_id: ProductId,
    /// Product name at purchase time.
    pub name: String,
    /// Purchased quantity.
    pub quantity: i32,
    /// Unit price at purchase time, in major units.
    pub unit_price: Decimal,
}
