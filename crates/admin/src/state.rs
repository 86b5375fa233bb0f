//! Application state shared across handlers.

use std::sync::Arc;

use rigbay_core::CurrencyCode;

use crate::commerce::{AdminCommerceClient, CommerceError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    commerce: AdminCommerceClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built.
    pub fn new(config: AdminConfig) -> Result<Self, CommerceError> {
        let commerce = AdminCommerceClient::new(&config.commerce)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, commerce }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &AdminCommerceClient {
        &self.inner.commerce
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }
}
