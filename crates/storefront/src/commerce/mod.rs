//! Commerce API client.
//!
//! # Architecture
//!
//! - The commerce API is the source of truth for products, carts, orders and
//!   users. There is no local copy beyond a short-lived cache.
//! - Catalog reads (products, categories, brands) walk a chain of endpoints
//!   and fall back to an empty result so listing pages still render when the
//!   API is degraded.
//! - In-memory caching via `moka` for catalog responses (5 minute TTL).
//! - Customer calls (cart, orders) carry the customer's bearer token.
//!
//! # Example
//!
//! ```rust,ignore
//! use rigbay_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce)?;
//! let products = client.list_products().await;
//! let cart = client.add_to_cart(&token, &AddToCart { variant_id, quantity: 1 }).await?;
//! ```

mod cache;
mod client;

pub use client::CommerceClient;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or expired customer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl CommerceError {
    /// A message safe to show a customer, when the API gave one.
    ///
    /// Only 4xx responses qualify; 5xx bodies may hold internals.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status { status, message } if (400..500).contains(status) && !message.is_empty() => {
                Some(message)
            }
            _ => None,
        }
    }
}

/// List responses arrive bare or wrapped, depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Wrapped {
        #[serde(alias = "products", alias = "categories", alias = "brands", alias = "items")]
        data: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Single-record responses, bare or wrapped (`{"cart": {...}}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum OneEnvelope<T> {
    Wrapped {
        #[serde(alias = "product", alias = "cart")]
        data: T,
    },
    Bare(T),
}

impl<T> OneEnvelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Pull a human-readable message out of an error body.
fn api_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error")]
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.message,
    )
}
