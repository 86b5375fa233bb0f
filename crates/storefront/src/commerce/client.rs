//! Commerce API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP. Caches catalog reads using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rigbay_core::catalog::{
    AddToCart, Brand, Cart, Category, LoginResponse, OrderPage, OrderQuery, Product,
    UpdateCartItem,
};
use rigbay_core::{CartItemId, ProductId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{api_message, CommerceError, ListEnvelope, OneEnvelope};
use crate::config::CommerceConfig;

/// Product list endpoints, fastest first.
const PRODUCT_ENDPOINTS: [&str; 3] = ["api/products/fast", "api/products", "api/products/fallback"];
const CATEGORY_ENDPOINTS: [&str; 2] = ["api/categories", "api/categories/fallback"];
const BRAND_ENDPOINTS: [&str; 2] = ["api/brands", "api/brands/fallback"];

const CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce API.
///
/// Catalog reads are cached for 5 minutes and degrade to empty results;
/// customer calls (cart, orders, login) are never cached and surface errors.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl CommerceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("rigbay-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CommerceError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
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

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
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

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CommerceError> {
        let url = self.endpoint(path)?;
        let envelope: ListEnvelope<T> = self.send(self.inner.client.get(url)).await?;
        Ok(envelope.into_vec())
    }

    /// Try each endpoint in turn; the first success wins.
    ///
    /// Returns `None` when every endpoint failed.
    async fn first_list<T: DeserializeOwned>(&self, paths: &[&str]) -> Option<Vec<T>> {
        for path in paths {
            match self.get_list::<T>(path).await {
                Ok(items) => {
                    debug!(endpoint = %path, count = items.len(), "Catalog endpoint answered");
                    return Some(items);
                }
                Err(e) => warn!(endpoint = %path, error = %e, "Catalog endpoint failed"),
            }
        }
        None
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Every product in the catalog.
    ///
    /// Walks `/api/products/fast`, `/api/products` and `/api/products/fallback`.
    /// When all three fail the result is empty (and not cached).
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Arc<Vec<Product>> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return products;
        }

        let Some(products) = self.first_list::<Product>(&PRODUCT_ENDPOINTS).await else {
            tracing::error!("All product endpoints failed; serving an empty catalog");
            return Arc::new(Vec::new());
        };

        let products = Arc::new(products);
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        products
    }

    /// A single product.
    ///
    /// Falls back to searching the product list when the detail endpoint is
    /// unavailable.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CommerceError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("api/products/{id}"))?;
        let product = match self
            .send::<OneEnvelope<Product>>(self.inner.client.get(url))
            .await
        {
            Ok(envelope) => envelope.into_inner(),
            Err(CommerceError::NotFound(_)) => {
                return Err(CommerceError::NotFound(format!("Product not found: {id}")));
            }
            Err(e) => {
                warn!(error = %e, "Product endpoint failed, searching product list");
                self.list_products()
                    .await
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or_else(|| CommerceError::NotFound(format!("Product not found: {id}")))?
            }
        };

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// All categories, or empty when both endpoints fail.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Arc<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return categories;
        }
        let Some(categories) = self.first_list::<Category>(&CATEGORY_ENDPOINTS).await else {
            return Arc::new(Vec::new());
        };
        let categories = Arc::new(categories);
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        categories
    }

    /// All brands, or empty when both endpoints fail.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Arc<Vec<Brand>> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            return brands;
        }
        let Some(brands) = self.first_list::<Brand>(&BRAND_ENDPOINTS).await else {
            return Arc::new(Vec::new());
        };
        let brands = Arc::new(brands);
        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;
        brands
    }

    /// Categories and brands for filter menus, fetched concurrently.
    pub async fn filter_options(&self) -> (Arc<Vec<Category>>, Arc<Vec<Brand>>) {
        tokio::join!(self.list_categories(), self.list_brands())
    }

    /// Whether the API answers at all; used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the non-success status.
    pub async fn ping(&self) -> Result<(), CommerceError> {
        let url = self.endpoint(CATEGORY_ENDPOINTS[0])?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CommerceError::Status {
                status: status.as_u16(),
                message: String::new(),
            })
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    async fn cart_request(
        &self,
        request: reqwest::RequestBuilder,
        token: &str,
    ) -> Result<Cart, CommerceError> {
        let envelope: OneEnvelope<Cart> = self.send(request.bearer_auth(token)).await?;
        Ok(envelope.into_inner())
    }

    /// The customer's current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &str) -> Result<Cart, CommerceError> {
        let url = self.endpoint("api/cart")?;
        self.cart_request(self.inner.client.get(url), token).await
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the line (e.g., out of stock).
    #[instrument(skip(self, token), fields(variant_id = %line.variant_id, quantity = line.quantity))]
    pub async fn add_to_cart(&self, token: &str, line: &AddToCart) -> Result<Cart, CommerceError> {
        let url = self.endpoint("api/cart/items")?;
        self.cart_request(self.inner.client.post(url).json(line), token)
            .await
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the API rejects the quantity.
    #[instrument(skip(self, token), fields(item_id = %item))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item: CartItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let url = self.endpoint(&format!("api/cart/items/{item}"))?;
        let body = UpdateCartItem { quantity };
        self.cart_request(self.inner.client.put(url).json(&body), token)
            .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item))]
    pub async fn remove_from_cart(
        &self,
        token: &str,
        item: CartItemId,
    ) -> Result<Cart, CommerceError> {
        let url = self.endpoint(&format!("api/cart/items/{item}"))?;
        self.cart_request(self.inner.client.delete(url), token).await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<Cart, CommerceError> {
        let url = self.endpoint("api/cart")?;
        self.cart_request(self.inner.client.delete(url), token).await
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// One page of the customer's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(
        &self,
        token: &str,
        query: &OrderQuery,
    ) -> Result<OrderPage, CommerceError> {
        let url = self.endpoint("api/user/orders")?;
        self.send(self.inner.client.get(url).query(query).bearer_auth(token))
            .await
    }

    /// Exchange credentials for a customer token.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Unauthorized` for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, CommerceError> {
        let url = self.endpoint("api/auth/login")?;
        self.send(
            self.inner
                .client
                .post(url)
                .json(&LoginRequest { email, password }),
        )
        .await
    }
}
