//! Wire types mirrored from the server API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clover_core::{Email, OrderId, ProductId, Role, UserId};

/// The authenticated user, as returned by auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

/// Auth response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthResponse {
    pub user: User,
}

/// Refresh response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(rename = "accessToken")]
    #[allow(dead_code)]
    pub access_token: String,
}

/// A catalog product.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
    #[serde(rename = "isFeatured", default)]
    pub is_featured: bool,
}

/// Category listing envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProductsResponse {
    pub products: Vec<Product>,
}

/// A cart entry joined to product data.
#[derive(Debug, Clone, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    pub quantity: i32,
}

/// A bare cart entry, as returned by cart mutations.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CartEntry {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The caller's active coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct Coupon {
    pub code: String,
    #[serde(rename = "discountPercentage")]
    pub discount_percentage: i32,
}

/// One product in a checkout request.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<&CartProduct> for CheckoutProduct {
    fn from(item: &CartProduct) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            image: item.image.clone(),
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: Decimal,
}

/// Result of confirming a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSuccess {
    pub success: bool,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

/// Server error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
