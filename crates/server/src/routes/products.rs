//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clover_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::services::catalog::{CatalogService, CreateProduct};
use crate::state::AppState;

/// Create-product request body.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Base64 image payload, uploaded to the image host when present.
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
}

/// Category listing envelope.
#[derive(Serialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

/// Plain message response.
#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn catalog(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.pool(), state.featured_cache(), state.images())
}

/// Full catalog listing (admin).
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(catalog(&state).list_all().await?))
}

/// Featured products, served through the read-through cache.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = catalog(&state).featured().await?;
    Ok(Json(products.as_ref().clone()))
}

/// Random product sample for the recommendation strip.
#[instrument(skip(state))]
pub async fn recommended(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(catalog(&state).recommended().await?))
}

/// Products in a category.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse> {
    let products = catalog(&state).by_category(&category).await?;
    Ok(Json(ProductsResponse { products }))
}

/// Create a product (admin).
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    let product = catalog(&state)
        .create(CreateProduct {
            name: body.name,
            description: body.description,
            price: body.price,
            image: body.image,
            category: body.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Delete a product (admin).
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    catalog(&state).delete(ProductId::new(id)).await?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}

/// Toggle the featured flag on a product (admin).
#[instrument(skip(state))]
pub async fn toggle_featured(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = catalog(&state).toggle_featured(ProductId::new(id)).await?;
    Ok(Json(product))
}
