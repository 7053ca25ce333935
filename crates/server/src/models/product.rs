//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use clover_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Unit price in the store currency's major unit.
    pub price: Decimal,
    /// Hosted image URL, if an image was uploaded.
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    /// Image host identifier used to delete the asset alongside the product.
    #[serde(skip)]
    pub image_public_id: Option<String>,
    /// Category the product is listed under.
    pub category: String,
    /// Whether the product appears in the featured carousel.
    #[serde(rename = "isFeatured")]
    pub is_featured: bool,
    /// When the product was created.
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}
