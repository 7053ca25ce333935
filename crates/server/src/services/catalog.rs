//! Catalog service.
//!
//! Product listings plus the featured-products read-through cache. The cache
//! is in-process (moka) with a short TTL and is explicitly invalidated by
//! every catalog mutation, so admin changes show up immediately while the
//! featured carousel stays cheap to serve.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};

use clover_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::{NewProduct, ProductRepository};
use crate::models::Product;
use crate::services::images::{ImageError, ImageStore};

/// Cache key for the featured product list. Single-entry cache, but keyed so
/// the entry can be replaced and invalidated by name.
const FEATURED_KEY: &str = "featured_products";

/// How long a cached featured list may be served before it is refetched.
const FEATURED_TTL: Duration = Duration::from_secs(300);

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Image host operation failed.
    #[error("image host error: {0}")]
    Image(#[from] ImageError),

    /// Product does not exist.
    #[error("product not found")]
    NotFound,

    /// Submitted product data is invalid.
    #[error("{0}")]
    Validation(String),
}

/// Read-through cache for the featured product list.
#[derive(Clone)]
pub struct FeaturedCache {
    inner: Cache<&'static str, Arc<Vec<Product>>>,
}

impl FeaturedCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(1)
                .time_to_live(FEATURED_TTL)
                .build(),
        }
    }

    async fn get(&self) -> Option<Arc<Vec<Product>>> {
        self.inner.get(&FEATURED_KEY).await
    }

    async fn set(&self, products: Arc<Vec<Product>>) {
        self.inner.insert(FEATURED_KEY, products).await;
    }

    async fn invalidate(&self) {
        self.inner.invalidate(&FEATURED_KEY).await;
    }
}

impl Default for FeaturedCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Input for creating a product via the admin API.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Base64 image payload to upload, if any.
    pub image: Option<String>,
    pub category: String,
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    cache: &'a FeaturedCache,
    images: Option<&'a ImageStore>,
}

impl<'a> CatalogService<'a> {
    /// Number of products returned by the recommendation sampler.
    pub const RECOMMENDED_COUNT: i64 = 4;

    /// Create a new catalog service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        cache: &'a FeaturedCache,
        images: Option<&'a ImageStore>,
    ) -> Self {
        Self {
            products: ProductRepository::new(pool),
            cache,
            images,
        }
    }

    /// List the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_all().await?)
    }

    /// List featured products through the cache.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the cache is cold and the
    /// database query fails.
    pub async fn featured(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(cached) = self.cache.get().await {
            debug!("featured products cache hit");
            return Ok(cached);
        }

        let products = Arc::new(self.products.list_featured().await?);
        self.cache.set(Arc::clone(&products)).await;

        Ok(products)
    }

    /// Uniform random sample of products for the recommendation strip.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn recommended(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.sample(Self::RECOMMENDED_COUNT).await?)
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_by_category(category).await?)
    }

    /// Create a product, uploading its image first when one was supplied and
    /// an image host is configured.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for non-positive prices or a blank
    /// name, `CatalogError::Image` if the upload fails, and
    /// `CatalogError::Repository` if the insert fails.
    pub async fn create(&self, input: CreateProduct) -> Result<Product, CatalogError> {
        if input.name.trim().is_empty() {
            return Err(CatalogError::Validation("name cannot be empty".to_owned()));
        }
        if input.price <= Decimal::ZERO {
            return Err(CatalogError::Validation(
                "price must be positive".to_owned(),
            ));
        }
        if input.category.trim().is_empty() {
            return Err(CatalogError::Validation(
                "category cannot be empty".to_owned(),
            ));
        }

        let mut image_url = None;
        let mut image_public_id = None;
        if let (Some(data), Some(images)) = (input.image.as_deref(), self.images) {
            let uploaded = images.upload(data).await?;
            image_url = Some(uploaded.secure_url);
            image_public_id = Some(uploaded.public_id);
        }

        let product = self
            .products
            .create(&NewProduct {
                name: input.name.trim().to_owned(),
                description: input.description,
                price: input.price,
                image_url,
                image_public_id,
                category: input.category.trim().to_owned(),
            })
            .await?;

        self.cache.invalidate().await;

        Ok(product)
    }

    /// Delete a product and best-effort delete its hosted image.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist and
    /// `CatalogError::Repository` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        let product = self.products.delete(id).await?.ok_or(CatalogError::NotFound)?;

        if let (Some(public_id), Some(images)) = (product.image_public_id.as_deref(), self.images)
            && let Err(e) = images.delete(public_id).await
        {
            // Row is already deleted; log the orphaned asset and continue.
            warn!("failed to delete hosted image {public_id}: {e}");
        }

        self.cache.invalidate().await;

        Ok(())
    }

    /// Flip the featured flag on a product and refresh the cache.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist and
    /// `CatalogError::Repository` if the update fails.
    pub async fn toggle_featured(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self
            .products
            .toggle_featured(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        // Repopulate rather than just invalidate, matching the featured
        // carousel's read path.
        let featured = self.products.list_featured().await?;
        self.cache.set(Arc::new(featured)).await;

        Ok(product)
    }
}
