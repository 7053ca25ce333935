//! Cart view types.

use rust_decimal::Decimal;
use serde::Serialize;

use clover_core::ProductId;

use super::Product;

/// A cart entry joined to its current product data.
///
/// Entries whose product has been deleted never appear here: the join drops
/// them and the foreign key cascade removes the orphaned rows.
#[derive(Debug, Clone, Serialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub category: String,
    pub quantity: i32,
}

impl CartProduct {
    /// Join a product with its cart quantity.
    #[must_use]
    pub fn from_product(product: Product, quantity: i32) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            category: product.category,
            quantity,
        }
    }
}
