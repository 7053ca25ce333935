//! Clover API client.
//!
//! Typed client for the storefront API, plus in-memory state stores that
//! mirror the server-side user/cart/coupon state the way the web frontend
//! does. Auth cookies are handled by the underlying cookie store; a 401 with
//! the expired-access-token code triggers a single-flight refresh and exactly
//! one retry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod refresh;
pub mod stores;
pub mod types;

pub use error::ClientError;
pub use refresh::RefreshCoordinator;
pub use stores::{CartStore, UserStore};

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use clover_core::ProductId;

use types::{
    ApiErrorBody, AuthResponse, CartEntry, CartProduct, CheckoutProduct, CheckoutSession,
    CheckoutSuccess, Coupon, Product, ProductsResponse, RefreshResponse, User,
};

/// Machine-readable code the server attaches to expired-access-token 401s.
pub const ACCESS_TOKEN_EXPIRED_CODE: &str = "ACCESS_TOKEN_EXPIRED";

/// Typed client for the Clover storefront API.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the underlying HTTP client cannot be
    /// built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh: RefreshCoordinator::new(),
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Create an account. Sets the auth cookies on success.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection (409 for duplicate email).
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            email: &'a str,
            password: &'a str,
        }

        let response: AuthResponse = self
            .execute(
                Method::POST,
                "/api/auth/signup",
                Some(&Body { name, email, password }),
            )
            .await?;

        Ok(response.user)
    }

    /// Login. Sets the auth cookies on success.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 on bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        #[derive(Serialize)]
        struct Body<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response: AuthResponse = self
            .execute(Method::POST, "/api/auth/login", Some(&Body { email, password }))
            .await?;

        Ok(response.user)
    }

    /// Logout and clear the session server-side.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` on transport failure.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .execute(Method::POST, "/api/auth/logout", None::<&()>)
            .await?;
        Ok(())
    }

    /// Fetch the current user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 401 when signed out.
    pub async fn profile(&self) -> Result<User, ClientError> {
        self.send(Method::GET, "/api/auth/profile", None::<&()>).await
    }

    /// Explicitly refresh the access token.
    ///
    /// Used internally by the retry path; exposed for session keep-alive.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the refresh token is missing, expired,
    /// or does not match the stored one.
    pub async fn refresh_token(&self) -> Result<(), ClientError> {
        let _: RefreshResponse = self
            .execute(Method::POST, "/api/auth/refresh-token", None::<&()>)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Featured products.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on server rejection.
    pub async fn featured_products(&self) -> Result<Vec<Product>, ClientError> {
        self.send(Method::GET, "/api/products/featured", None::<&()>).await
    }

    /// Random product recommendations.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on server rejection.
    pub async fn recommended_products(&self) -> Result<Vec<Product>, ClientError> {
        self.send(Method::GET, "/api/products/recommended", None::<&()>)
            .await
    }

    /// Products in a category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on server rejection.
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ClientError> {
        let response: ProductsResponse = self
            .send(
                Method::GET,
                &format!("/api/products/category/{category}"),
                None::<&()>,
            )
            .await?;
        Ok(response.products)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Cart contents joined to product data.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 401 when signed out.
    pub async fn cart(&self) -> Result<Vec<CartProduct>, ClientError> {
        self.send(Method::GET, "/api/cart", None::<&()>).await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 404 for unknown products.
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: Option<i64>,
    ) -> Result<Vec<CartEntry>, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            product_id: ProductId,
            #[serde(skip_serializing_if = "Option::is_none")]
            quantity: Option<i64>,
        }

        self.send(
            Method::POST,
            "/api/cart",
            Some(&Body {
                product_id,
                quantity,
            }),
        )
        .await
    }

    /// Remove one product from the cart, or clear it when `product_id` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on server rejection.
    pub async fn remove_from_cart(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<CartEntry>, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            product_id: Option<ProductId>,
        }

        self.send(Method::DELETE, "/api/cart", Some(&Body { product_id }))
            .await
    }

    /// Set the quantity of a cart entry. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 404 when the entry is not in the cart.
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Vec<CartEntry>, ClientError> {
        #[derive(Serialize)]
        struct Body {
            quantity: i64,
        }

        self.send(
            Method::PUT,
            &format!("/api/cart/{product_id}"),
            Some(&Body { quantity }),
        )
        .await
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// The caller's active coupon.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 404 when no coupon is active.
    pub async fn coupon(&self) -> Result<Coupon, ClientError> {
        self.send(Method::GET, "/api/coupons", None::<&()>).await
    }

    /// Validate a coupon code.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 404 for unknown codes and 400 for
    /// expired ones.
    pub async fn validate_coupon(&self, code: &str) -> Result<Coupon, ClientError> {
        #[derive(Serialize)]
        struct Body<'a> {
            code: &'a str,
        }

        self.send(Method::POST, "/api/coupons/validate", Some(&Body { code }))
            .await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Create a checkout session for the given cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 400 for an empty product list or an
    /// invalid coupon.
    pub async fn create_checkout_session(
        &self,
        products: &[CheckoutProduct],
        coupon_code: Option<&str>,
    ) -> Result<CheckoutSession, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            products: &'a [CheckoutProduct],
            #[serde(skip_serializing_if = "Option::is_none")]
            coupon_code: Option<&'a str>,
        }

        self.send(
            Method::POST,
            "/api/payments/checkout-session",
            Some(&Body {
                products,
                coupon_code,
            }),
        )
        .await
    }

    /// Confirm a paid checkout session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with 400 when the session is not paid.
    pub async fn checkout_success(&self, session_id: &str) -> Result<CheckoutSuccess, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            session_id: &'a str,
        }

        self.send(
            Method::POST,
            "/api/payments/checkout-success",
            Some(&Body { session_id }),
        )
        .await
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Issue a request, refreshing the access token and retrying exactly once
    /// if the server reports it expired.
    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let observed_generation = self.refresh.generation().await;

        match self.execute(method.clone(), path, body).await {
            Err(err) if err.is_access_token_expired() => {
                debug!(path, "access token expired; refreshing");

                self.refresh
                    .refresh(observed_generation, || async {
                        self.refresh_token().await
                    })
                    .await
                    .map_err(|_| ClientError::SessionExpired)?;

                self.execute(method, path, body).await
            }
            other => other,
        }
    }

    /// Issue a request without the refresh-retry wrapper.
    async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or(ApiErrorBody {
                message: status.to_string(),
                code: None,
            });

            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body.message,
                code: body.code,
            });
        }

        Ok(response.json().await?)
    }
}
