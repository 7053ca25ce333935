//! Hosted payment-session API client.
//!
//! Thin REST client over the gateway's checkout-session endpoints. The
//! gateway hosts the actual payment page; this service only creates sessions,
//! retrieves their final state, and mints one-time percentage coupons to
//! attach as session discounts.
//!
//! The base URL is configurable so tests can point the client at a local
//! mock.

pub mod types;

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::PaymentConfig;

use types::{CheckoutSession, GatewayCoupon, LineItem, LineItemList};

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway error ({status}): {message}")]
    Api {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Error message from the gateway response body.
        message: String,
    },
}

/// Client for the payment gateway REST API.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            inner: Arc::new(PaymentClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.expose_secret().to_string(),
            }),
        }
    }

    /// Create a checkout session from pre-built form parameters.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` on transport failure or `PaymentError::Api`
    /// if the gateway rejects the session.
    #[instrument(skip(self, params))]
    pub async fn create_checkout_session(
        &self,
        params: &[(String, String)],
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.inner.base_url);
        self.post_form(&url, params).await
    }

    /// Retrieve a finalized checkout session by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` on transport failure or `PaymentError::Api`
    /// if the gateway does not know the session.
    #[instrument(skip(self))]
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions/{session_id}", self.inner.base_url);

        let response = self
            .inner
            .client
            .get(&url)
            .basic_auth(&self.inner.secret_key, None::<&str>)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// List the line items of a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` on transport failure or `PaymentError::Api`
    /// on a gateway error.
    #[instrument(skip(self))]
    pub async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, PaymentError> {
        let url = format!(
            "{}/v1/checkout/sessions/{session_id}/line_items",
            self.inner.base_url
        );

        let response = self
            .inner
            .client
            .get(&url)
            .basic_auth(&self.inner.secret_key, None::<&str>)
            .send()
            .await?;

        let list: LineItemList = Self::read_json(response).await?;
        Ok(list.data)
    }

    /// Create a one-time percentage coupon on the gateway side.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` on transport failure or `PaymentError::Api`
    /// on a gateway error.
    #[instrument(skip(self))]
    pub async fn create_coupon(&self, percent_off: i32) -> Result<GatewayCoupon, PaymentError> {
        let url = format!("{}/v1/coupons", self.inner.base_url);
        let params = [
            ("percent_off".to_string(), percent_off.to_string()),
            ("duration".to_string(), "once".to_string()),
        ];

        self.post_form(&url, &params).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<T, PaymentError> {
        debug!(url, "gateway request");

        let response = self
            .inner
            .client
            .post(url)
            .basic_auth(&self.inner.secret_key, None::<&str>)
            .form(params)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<types::ErrorResponse>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());

            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
