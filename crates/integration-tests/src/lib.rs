//! Integration tests for Rigbay.
//!
//! Each test starts the real storefront and admin routers on ephemeral ports,
//! backed by a `wiremock` server standing in for the commerce API, and drives
//! them over HTTP with a cookie-keeping `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rigbay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_shopping` - Browse, sign in, cart and checkout
//! - `pc_builder` - Builder page picks and the JSON summary API
//! - `admin_products` - Product CRUD through the panel, seen by the storefront

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use rigbay_admin::config::{AdminCommerceConfig, AdminConfig};
use rigbay_core::CurrencyCode;
use rigbay_core::checkout::ShippingPolicy;
use rigbay_storefront::config::{BuilderConfig, CommerceConfig, StorefrontConfig};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Strong enough to pass secret validation.
pub const TEST_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

/// Errors starting a test server.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("storefront state: {0}")]
    Storefront(#[from] rigbay_storefront::state::StateError),
    #[error("admin state: {0}")]
    Admin(#[from] rigbay_admin::commerce::CommerceError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A running app plus a client that keeps its cookies.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Storefront settings pointed at `api_url`: LKR, Rs. 500 shipping, free
/// from Rs. 100,000, bundled PC Builder catalog.
///
/// # Errors
///
/// Returns an error if `api_url` is not an HTTP URL.
pub fn storefront_config(api_url: &str) -> Result<StorefrontConfig, HarnessError> {
    let api_url = rigbay_storefront::config::parse_api_url("COMMERCE_API_URL", api_url)
        .map_err(|e| HarnessError::Config(e.to_string()))?;
    Ok(StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(TEST_SECRET),
        commerce: CommerceConfig {
            api_url,
            timeout: Duration::from_secs(5),
        },
        builder: BuilderConfig::default(),
        currency: CurrencyCode::LKR,
        shipping: ShippingPolicy {
            fee: Decimal::from(500),
            free_threshold: Some(Decimal::from(100_000)),
        },
        trust_proxy_headers: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    })
}

/// Admin settings pointed at `api_url`.
///
/// # Errors
///
/// Returns an error if `api_url` is not an HTTP URL.
pub fn admin_config(api_url: &str) -> Result<AdminConfig, HarnessError> {
    let api_url = rigbay_admin::config::parse_api_url("COMMERCE_API_URL", api_url)
        .map_err(|e| HarnessError::Config(e.to_string()))?;
    Ok(AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        commerce: AdminCommerceConfig {
            api_url,
            api_token: SecretString::from(TEST_SECRET),
            timeout: Duration::from_secs(5),
        },
        currency: CurrencyCode::LKR,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    })
}

/// Start the storefront against a mocked commerce API.
///
/// # Errors
///
/// Returns an error if state cannot be built or the port cannot be bound.
pub async fn spawn_storefront(api_url: &str) -> Result<TestServer, HarnessError> {
    let state = rigbay_storefront::state::AppState::new(storefront_config(api_url)?)?;
    serve(rigbay_storefront::routes::app(state)).await
}

/// Start the admin panel against a mocked commerce API.
///
/// # Errors
///
/// Returns an error if state cannot be built or the port cannot be bound.
pub async fn spawn_admin(api_url: &str) -> Result<TestServer, HarnessError> {
    let state = rigbay_admin::state::AppState::new(admin_config(api_url)?)?;
    serve(rigbay_admin::routes::app(state)).await
}

async fn serve(app: axum::Router) -> Result<TestServer, HarnessError> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        // Runs until the owning TestServer is dropped.
        axum::serve(listener, service).await.ok();
    });

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(10))
        .build()?;

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        client,
        handle,
    })
}
