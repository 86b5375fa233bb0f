//! Application state shared across handlers.

use std::sync::Arc;

use rigbay_core::checkout::ShippingPolicy;
use rigbay_core::CurrencyCode;

use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::services::{CartSessions, CatalogLoadError, PcBuilder};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("commerce client: {0}")]
    Commerce(#[from] CommerceError),
    #[error("PC Builder catalog: {0}")]
    Catalog(#[from] CatalogLoadError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the commerce client, cart sessions, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    carts: CartSessions,
    builder: PcBuilder,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built or the PC Builder
    /// catalog can't be loaded.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let builder = PcBuilder::load(&config.builder)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                carts: CartSessions::new(),
                builder,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the per-customer cart sessions.
    #[must_use]
    pub fn carts(&self) -> &CartSessions {
        &self.inner.carts
    }

    /// Get a reference to the PC Builder service.
    #[must_use]
    pub fn builder(&self) -> &PcBuilder {
        &self.inner.builder
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }

    #[must_use]
    pub fn shipping(&self) -> ShippingPolicy {
        self.inner.config.shipping
    }
}
