//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (DB ping)
//!
//! # Auth
//! POST /api/auth/signup                 - Create account, set auth cookies
//! POST /api/auth/login                  - Login, set auth cookies
//! POST /api/auth/logout                 - Invalidate refresh token, clear cookies
//! POST /api/auth/refresh-token          - Mint a new access token
//! GET  /api/auth/profile                - Current user
//!
//! # Products
//! GET    /api/products                  - Full catalog (admin)
//! POST   /api/products                  - Create product (admin)
//! GET    /api/products/featured         - Featured products (cached)
//! GET    /api/products/recommended      - Random sample
//! GET    /api/products/category/{name}  - Category listing
//! PATCH  /api/products/{id}             - Toggle featured flag (admin)
//! DELETE /api/products/{id}             - Delete product (admin)
//!
//! # Cart (authenticated)
//! GET    /api/cart                      - Cart contents joined to products
//! POST   /api/cart                      - Add item (merges quantities)
//! DELETE /api/cart                      - Remove one item, or clear all
//! PUT    /api/cart/{id}                 - Set quantity (0 removes)
//!
//! # Coupons (authenticated)
//! GET  /api/coupons                     - Active coupon
//! POST /api/coupons/validate            - Validate a code
//!
//! # Payments (authenticated)
//! POST /api/payments/checkout-session   - Create gateway session
//! POST /api/payments/checkout-success   - Confirm payment, record order
//!
//! # Analytics (admin)
//! GET  /api/analytics                   - Overview + 7-day daily series
//! ```

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod payments;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh-token", post(auth::refresh))
        .route("/profile", get(auth::profile))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/featured", get(products::featured))
        .route("/recommended", get(products::recommended))
        .route("/category/{category}", get(products::by_category))
        .route(
            "/{id}",
            axum::routing::patch(products::toggle_featured).delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::get_cart).post(cart::add_to_cart).delete(cart::remove_from_cart),
        )
        .route("/{id}", axum::routing::put(cart::update_quantity))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::get_coupon))
        .route("/validate", post(coupons::validate))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout-session", post(payments::create_checkout_session))
        .route("/checkout-success", post(payments::checkout_success))
}

/// Create the analytics routes router.
pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/", get(analytics::overview))
}

/// Assemble every API route under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/coupons", coupon_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/analytics", analytics_routes())
}
