//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /                       - Redirect to /products
//!
//! # Products (commerce API, admin token)
//! GET  /products               - Product listing (search, page)
//! GET  /products/new           - Create form
//! POST /products               - Create product
//! GET  /products/:id/edit      - Edit form
//! POST /products/:id           - Update product
//! POST /products/:id/delete    - Delete product
//! ```

pub mod products;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
    middleware::from_fn,
    response::Redirect,
    routing::{get, post},
};
use rigbay_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::Session;
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use crate::models::session_keys;
use crate::state::AppState;

/// Page chrome every full page renders.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub flash: Option<String>,
}

impl Layout {
    /// Build the layout for a page, consuming any pending flash notice.
    pub async fn load(session: &Session) -> Self {
        Self {
            flash: session
                .remove::<String>(session_keys::FLASH)
                .await
                .ok()
                .flatten(),
        }
    }
}

/// Queue a one-shot notice for the next full page.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Format an amount in the store currency.
#[must_use]
pub fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
}

/// The complete admin application with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

    Router::new()
        .route("/health", get(health))
        .route("/", get(|| async { Redirect::to("/products") }))
        .nest("/products", product_routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
