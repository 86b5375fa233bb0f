//! Admin commerce API client implementation.

use std::sync::Arc;

use reqwest::Method;
use rigbay_core::catalog::{Brand, Category, Product, ProductInput};
use rigbay_core::ProductId;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{api_message, CommerceError, ListEnvelope, OneEnvelope};
use crate::config::AdminCommerceConfig;

/// Product list endpoints, fastest first.
const PRODUCT_ENDPOINTS: [&str; 3] = ["api/products/fast", "api/products", "api/products/fallback"];
const CATEGORY_ENDPOINTS: [&str; 2] = ["api/categories", "api/categories/fallback"];
const BRAND_ENDPOINTS: [&str; 2] = ["api/brands", "api/brands/fallback"];

/// Client for product management on the commerce API.
#[derive(Clone)]
pub struct AdminCommerceClient {
    inner: Arc<AdminCommerceClientInner>,
}

struct AdminCommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl AdminCommerceClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AdminCommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("rigbay-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminCommerceClientInner {
                client,
                base_url: config.api_url.clone(),
                token: config.api_token.clone(),
            }),
        })
    }

    /// An authorized request builder for `path`.
    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, CommerceError> {
        let url = self.inner.base_url.join(path)?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.token.expose_secret()))
    }

    /// Send a request and return the body of a successful response.
    async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<String, CommerceError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::error!(status = %status, "Commerce API rejected the admin token");
            return Err(CommerceError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(api_message(&body)));
        }
        if !status.is_success() {
            warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Status {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }

        Ok(body)
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    /// Try each endpoint in turn; the first success wins.
    ///
    /// Returns the last error when every endpoint failed.
    async fn first_list<T: DeserializeOwned>(&self, paths: &[&str]) -> Result<Vec<T>, CommerceError> {
        let mut last_error = CommerceError::NotFound("no endpoints".to_string());
        for path in paths {
            let result = match self.request(Method::GET, path) {
                Ok(request) => self.send::<ListEnvelope<T>>(request).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(envelope) => {
                    let items = envelope.into_vec();
                    debug!(endpoint = %path, count = items.len(), "Catalog endpoint answered");
                    return Ok(items);
                }
                Err(e) => {
                    warn!(endpoint = %path, error = %e, "Catalog endpoint failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product in the catalog.
    ///
    /// Walks `/api/products/fast`, `/api/products` and `/api/products/fallback`.
    ///
    /// # Errors
    ///
    /// Returns the last endpoint's error when all three fail.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        self.first_list(&PRODUCT_ENDPOINTS).await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CommerceError> {
        let request = self.request(Method::GET, &format!("api/products/{id}"))?;
        match self.send::<OneEnvelope<Product>>(request).await {
            Ok(envelope) => Ok(envelope.into_inner()),
            Err(CommerceError::NotFound(_)) => {
                Err(CommerceError::NotFound(format!("Product not found: {id}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the product (e.g., duplicate SKU).
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, CommerceError> {
        let request = self.request(Method::POST, "api/products")?.json(input);
        let product = self.send::<OneEnvelope<Product>>(request).await?.into_inner();
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields and variants.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is gone or the API rejects the update.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, CommerceError> {
        let request = self
            .request(Method::PUT, &format!("api/products/{id}"))?
            .json(input);
        let product = self.send::<OneEnvelope<Product>>(request).await?.into_inner();
        tracing::info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is gone or the API refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CommerceError> {
        let request = self.request(Method::DELETE, &format!("api/products/{id}"))?;
        self.send_raw(request).await?;
        tracing::info!("Product deleted");
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// All categories, or empty when both endpoints fail.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Vec<Category> {
        self.first_list(&CATEGORY_ENDPOINTS).await.unwrap_or_default()
    }

    /// All brands, or empty when both endpoints fail.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Vec<Brand> {
        self.first_list(&BRAND_ENDPOINTS).await.unwrap_or_default()
    }

    /// Categories and brands for the product form, fetched concurrently.
    pub async fn form_options(&self) -> (Vec<Category>, Vec<Brand>) {
        tokio::join!(self.list_categories(), self.list_brands())
    }
}
