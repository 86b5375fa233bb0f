//! Commerce API client for product management.
//!
//! # Security
//!
//! Every request carries the admin bearer token (HIGH PRIVILEGE). Nothing is
//! cached: after a write the next read must see it.
//!
//! # Example
//!
//! ```rust,ignore
//! use rigbay_admin::commerce::AdminCommerceClient;
//!
//! let client = AdminCommerceClient::new(&config.commerce)?;
//! let products = client.list_products().await?;
//! let created = client.create_product(&input).await?;
//! ```

mod client;

pub use client::AdminCommerceClient;

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

    /// The admin token was rejected.
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
    /// The API's own explanation for a rejected write, when it gave one.
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

/// Single-record responses, bare or wrapped (`{"product": {...}}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum OneEnvelope<T> {
    Wrapped {
        #[serde(alias = "product")]
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rigbay_core::catalog::Product;

    use super::*;

    #[test]
    fn test_one_envelope_shapes() {
        let wrapped: OneEnvelope<Product> =
            serde_json::from_str(r#"{"product": {"id": 7, "name": "RTX 4070"}}"#).unwrap();
        assert_eq!(wrapped.into_inner().name, "RTX 4070");

        let bare: OneEnvelope<Product> =
            serde_json::from_str(r#"{"id": 8, "name": "RX 7800 XT"}"#).unwrap();
        assert_eq!(bare.into_inner().name, "RX 7800 XT");
    }

    #[test]
    fn test_user_message_only_for_client_errors() {
        let err = CommerceError::Status {
            status: 409,
            message: "SKU already exists".into(),
        };
        assert_eq!(err.user_message(), Some("SKU already exists"));
        assert_eq!(CommerceError::Unauthorized.user_message(), None);
    }
}
