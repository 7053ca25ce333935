//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::gateway::PaymentClient;
use crate::services::auth::{RefreshTokenStore, TokenService};
use crate::services::catalog::FeaturedCache;
use crate::services::images::ImageStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like the database pool, token services, and external clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    tokens: TokenService,
    token_store: RefreshTokenStore,
    payments: PaymentClient,
    images: Option<ImageStore>,
    featured_cache: FeaturedCache,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, token_store: RefreshTokenStore) -> Self {
        let tokens = TokenService::new(&config.tokens, config.production);
        let payments = PaymentClient::new(&config.payments);
        let images = config.images.as_ref().map(ImageStore::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                token_store,
                payments,
                images,
                featured_cache: FeaturedCache::new(),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the refresh token store.
    #[must_use]
    pub fn token_store(&self) -> &RefreshTokenStore {
        &self.inner.token_store
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Get a reference to the image host client, if configured.
    #[must_use]
    pub fn images(&self) -> Option<&ImageStore> {
        self.inner.images.as_ref()
    }

    /// Get a reference to the featured-products cache.
    #[must_use]
    pub fn featured_cache(&self) -> &FeaturedCache {
        &self.inner.featured_cache
    }
}
