//! Cart route handlers.
//!
//! Mutations return the refreshed entry list so the client store can
//! reconcile its optimistic state against the server's.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use clover_core::ProductId;

use crate::db::RepositoryError;
use crate::db::cart::{CartEntry, CartRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::CartProduct;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: i32,
    /// Coerced to a positive integer; invalid or missing becomes 1.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Remove-from-cart request body. Without a product ID the whole cart is
/// cleared.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    #[serde(default)]
    pub product_id: Option<i32>,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Coerce a client-supplied quantity to a positive integer, defaulting to 1.
fn normalize_quantity(quantity: Option<i64>) -> i32 {
    match quantity {
        Some(q) if q >= 1 => i32::try_from(q).unwrap_or(i32::MAX),
        _ => 1,
    }
}

/// Cart contents joined to current product data.
#[instrument(skip(state, user))]
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CartProduct>>> {
    let products = CartRepository::new(state.pool())
        .products_for_user(user.id)
        .await?;

    Ok(Json(products))
}

/// Add a product to the cart, merging quantities with any existing entry.
#[instrument(skip(state, user, body))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<Vec<CartEntry>>> {
    let cart = CartRepository::new(state.pool());
    let product_id = ProductId::new(body.product_id);
    let quantity = normalize_quantity(body.quantity);

    cart.add(user.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(cart.entries(user.id).await?))
}

/// Remove one product from the cart, or clear the cart entirely when no
/// product ID was supplied.
#[instrument(skip(state, user, body))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RemoveFromCartRequest>,
) -> Result<Json<Vec<CartEntry>>> {
    let cart = CartRepository::new(state.pool());

    match body.product_id {
        Some(id) => cart.remove(user.id, ProductId::new(id)).await?,
        None => cart.clear(user.id).await?,
    }

    Ok(Json(cart.entries(user.id).await?))
}

/// Set the quantity of a cart entry. Zero removes the entry.
#[instrument(skip(state, user, body))]
pub async fn update_quantity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<Vec<CartEntry>>> {
    let cart = CartRepository::new(state.pool());
    let product_id = ProductId::new(id);

    if body.quantity < 0 {
        return Err(AppError::BadRequest("Quantity cannot be negative".to_owned()));
    }

    if body.quantity == 0 {
        // Only entries that exist can be removed via quantity update.
        let entries = cart.entries(user.id).await?;
        if !entries.iter().any(|e| e.product_id == product_id) {
            return Err(AppError::NotFound("Item not found in cart".to_owned()));
        }
        cart.remove(user.id, product_id).await?;
    } else {
        let quantity = i32::try_from(body.quantity).unwrap_or(i32::MAX);
        cart.set_quantity(user.id, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    AppError::NotFound("Item not found in cart".to_owned())
                }
                other => AppError::Database(other),
            })?;
    }

    Ok(Json(cart.entries(user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_quantity() {
        assert_eq!(normalize_quantity(None), 1);
        assert_eq!(normalize_quantity(Some(0)), 1);
        assert_eq!(normalize_quantity(Some(-10)), 1);
        assert_eq!(normalize_quantity(Some(3)), 3);
        assert_eq!(normalize_quantity(Some(i64::MAX)), i32::MAX);
    }
}
