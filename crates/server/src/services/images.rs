//! Image host client.
//!
//! Uploads product images (sent by the admin UI as base64 data URLs) to the
//! hosted image service and deletes them when the product goes away. The
//! service is optional: without `IMAGE_API_URL` configured, products are
//! created without hosted images.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::ImageHostConfig;

/// Errors that can occur when talking to the image host.
#[derive(Debug, Error)]
pub enum ImageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image host rejected the request.
    #[error("image host error ({status}): {message}")]
    Api {
        /// HTTP status returned by the host.
        status: u16,
        /// Response body.
        message: String,
    },
}

/// A successfully uploaded image.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// Public URL to serve the image from.
    pub secure_url: String,
    /// Host-side identifier used for deletion.
    pub public_id: String,
}

/// Client for the image hosting API.
#[derive(Clone)]
pub struct ImageStore {
    inner: Arc<ImageStoreInner>,
}

struct ImageStoreInner {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    folder: String,
}

impl ImageStore {
    /// Create a new image host client.
    #[must_use]
    pub fn new(config: &ImageHostConfig) -> Self {
        Self {
            inner: Arc::new(ImageStoreInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                folder: config.folder.clone(),
            }),
        }
    }

    /// Upload an image payload (base64 data URL) and return its hosted URL
    /// and public ID.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Http` on transport failure or `ImageError::Api`
    /// if the host rejects the upload.
    #[instrument(skip(self, data))]
    pub async fn upload(&self, data: &str) -> Result<UploadedImage, ImageError> {
        let url = format!("{}/upload", self.inner.api_url);
        let params = [
            ("file", data),
            ("folder", self.inner.folder.as_str()),
        ];

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.api_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ImageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Delete a previously uploaded image.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Http` on transport failure or `ImageError::Api`
    /// if the host rejects the deletion.
    #[instrument(skip(self))]
    pub async fn delete(&self, public_id: &str) -> Result<(), ImageError> {
        let url = format!("{}/destroy", self.inner.api_url);
        let params = [("public_id", public_id)];

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.api_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ImageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
