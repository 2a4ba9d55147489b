//! Application state shared across handlers.

use std::sync::Arc;

use crate::analytics::Analytics;
use crate::config::StorefrontConfig;
use crate::shopify::{Locale, StorefrontClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Handlers normally go through
/// [`crate::context::LoaderContext`] rather than reaching into it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    analytics: Analytics,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                analytics: Analytics::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the analytics emitter.
    #[must_use]
    pub fn analytics(&self) -> &Analytics {
        &self.inner.analytics
    }

    /// The locale used for requests without a locale prefix.
    #[must_use]
    pub fn default_locale(&self) -> Locale {
        let locale = &self.inner.config.locale;
        Locale::new(&locale.country, &locale.language)
    }
}
