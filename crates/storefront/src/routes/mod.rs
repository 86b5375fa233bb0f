//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (commerce API reachable)
//!
//! # Products
//! GET  /products               - Product listing (HTMX results fragment)
//! GET  /products/:id           - Product detail
//!
//! # Cart (requires login, HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires login)
//! GET  /checkout               - Shipping form
//! POST /checkout               - Validate and stash shipping details
//! GET  /checkout/payment       - Payment summary
//!
//! # Account (requires login)
//! GET  /account/orders         - Order history
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! POST /auth/logout            - Logout action
//!
//! # PC Builder
//! GET  /pc-builder             - Builder page
//! POST /pc-builder/select      - Put a part in its slot
//! POST /pc-builder/remove      - Empty a slot
//! POST /pc-builder/clear       - Start over
//!
//! # JSON API (rate limited)
//! GET  /api/pc-builder/components?category=
//! POST /api/pc-builder/summary
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod pc_builder;
pub mod products;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{get, post},
};
use rigbay_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::Session;

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

// =============================================================================
// Shared Page Chrome
// =============================================================================

/// Header and flash data every full page renders.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub customer_name: Option<String>,
    pub flash: Option<String>,
}

impl Layout {
    /// Build the layout for a page, consuming any pending flash notice.
    pub async fn load(session: &Session, customer: Option<&CurrentCustomer>) -> Self {
        Self {
            customer_name: customer.map(|c| c.display_name().to_string()),
            flash: take_flash(session).await,
        }
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.customer_name.is_some()
    }
}

/// Queue a one-shot notice for the next full page.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Format an amount in the store currency, e.g. `Rs. 124,500.00`.
#[must_use]
pub fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Whether the request came from HTMX (wants a fragment, not a page).
#[must_use]
pub fn is_htmx(headers: &axum::http::HeaderMap) -> bool {
    headers.get("hx-request").is_some_and(|v| v == "true")
}

// =============================================================================
// Routers
// =============================================================================

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::shipping_page).post(checkout::submit_shipping))
        .route("/payment", get(checkout::payment))
}

/// Create the auth routes router.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter(trust_proxy_headers))),
        )
        .route("/logout", post(auth::logout))
}

/// Create the PC Builder page routes router.
pub fn pc_builder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pc_builder::show))
        .route("/select", post(pc_builder::select))
        .route("/remove", post(pc_builder::remove))
        .route("/clear", post(pc_builder::clear))
}

/// Create the JSON API routes router.
pub fn api_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/pc-builder/components", get(api::components))
        .route("/pc-builder/summary", post(api::summary))
        .layer(api_rate_limiter(trust_proxy_headers))
}

/// Create all page and API routes for the storefront.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/account/orders", get(account::orders))
        .nest("/auth", auth_routes(trust_proxy_headers))
        .nest("/pc-builder", pc_builder_routes())
        .nest("/api", api_routes(trust_proxy_headers))
}

/// The complete storefront application with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes(state.config().trust_proxy_headers))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the commerce API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.commerce().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
