//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the commerce API; [`CartSessions`] keeps the
//! customer's latest applied copy so overlapping quantity changes resolve to
//! the newest one.
//!
//! [`CartSessions`]: crate::services::CartSessions

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use rigbay_core::cart::CartState;
use rigbay_core::catalog::CartItem;
use rigbay_core::checkout::{CheckoutSummary, ShippingPolicy};
use rigbay_core::{CartItemId, CurrencyCode, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, money};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentCustomer;
use crate::services::CartOp;
use crate::services::cart::failure_message;
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub brand: String,
    pub sku: String,
    pub quantity: u32,
    pub stock: i64,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
    pub exceeds_stock: bool,
}

impl CartItemView {
    pub(crate) fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        let product = &item.variant.product;
        Self {
            id: item.id.as_i64(),
            product_id: product.id.as_i64(),
            name: product.name.clone(),
            brand: product
                .brand
                .as_ref()
                .map(|b| b.name.clone())
                .unwrap_or_default(),
            sku: item.variant.sku.clone(),
            quantity: item.quantity,
            stock: item.variant.stock,
            price: money(item.variant.price, currency),
            line_total: money(item.line_total(), currency),
            image: product.images.first().map(|img| img.url.clone()),
            exceeds_stock: item.exceeds_stock(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping: bool,
    pub stock_issues: usize,
    pub error: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(state: &CartState, currency: CurrencyCode, policy: &ShippingPolicy) -> Self {
        let summary = CheckoutSummary::from_cart(state, policy);
        Self {
            items: state
                .items()
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            item_count: summary.item_count,
            subtotal: money(summary.subtotal, currency),
            shipping: money(summary.shipping, currency),
            total: money(summary.total, currency),
            free_shipping: summary.is_free_shipping(),
            stock_issues: state.stock_issues().len(),
            error: state.last_error().map(String::from),
        }
    }

    #[must_use]
    pub const fn can_checkout(&self) -> bool {
        !self.items.is_empty() && self.stock_issues == 0
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: i64,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: i64,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline notice fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub message: String,
    pub is_error: bool,
}

fn cart_view(state: &AppState, cart: &CartState) -> CartView {
    CartView::new(cart, state.currency(), &state.shipping())
}

/// Run a cart change and render the items fragment from whatever state is
/// newest afterwards, including a recorded failure.
async fn apply_and_render(state: &AppState, customer: &CurrentCustomer, op: CartOp) -> Response {
    let carts = state.carts();
    let cart = match carts
        .apply(state.commerce(), customer.id, &customer.token, op)
        .await
    {
        Ok(cart) => cart,
        Err(e) => {
            tracing::warn!(error = %e, "Cart update failed");
            carts.cached(customer.id).await.unwrap_or_default()
        }
    };

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(state, &cart),
        },
    )
        .into_response()
}

/// Display cart page.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> impl IntoResponse {
    let carts = state.carts();
    let cart = match carts
        .refresh(state.commerce(), customer.id, &customer.token)
        .await
    {
        Ok(cart) => cart,
        Err(e) => {
            // The failure is recorded on the cached state and shown inline.
            tracing::warn!("Failed to fetch cart: {e}");
            carts.cached(customer.id).await.unwrap_or_default()
        }
    };

    CartShowTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        cart: cart_view(&state, &cart),
    }
}

/// Add item to cart (HTMX).
///
/// Returns the new count badge plus an HTMX trigger so the cart page and
/// other badges refresh.
#[instrument(skip(state, customer, form), fields(user_id = %customer.id, variant_id = form.variant_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let op = CartOp::Add {
        variant_id: VariantId::new(form.variant_id),
        quantity: form.quantity.unwrap_or(1).max(1),
    };

    match state
        .carts()
        .apply(state.commerce(), customer.id, &customer.token, op)
        .await
    {
        Ok(cart) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add item to cart");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                NoticeTemplate {
                    message: failure_message(&e),
                    is_error: true,
                },
            )
                .into_response()
        }
    }
}

/// Update cart item quantity (HTMX). A quantity of zero removes the line.
#[instrument(skip(state, customer, form), fields(user_id = %customer.id, item_id = form.item_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let op = CartOp::SetQuantity {
        item: CartItemId::new(form.item_id),
        quantity: form.quantity,
    };
    apply_and_render(&state, &customer, op).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, customer, form), fields(user_id = %customer.id, item_id = form.item_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let op = CartOp::Remove {
        item: CartItemId::new(form.item_id),
    };
    apply_and_render(&state, &customer, op).await
}

/// Empty the cart (HTMX).
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn clear(State(state): State<AppState>, RequireAuth(customer): RequireAuth) -> Response {
    apply_and_render(&state, &customer, CartOp::Clear).await
}

/// Get cart count badge (HTMX).
///
/// Guests always see zero. Signed-in customers get the last known count,
/// fetched once if this session has no cart state yet.
#[instrument(skip(state, customer))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
) -> impl IntoResponse {
    let count = match customer {
        Some(customer) => match state.carts().cached(customer.id).await {
            Some(cart) => cart.item_count(),
            None => state
                .carts()
                .refresh(state.commerce(), customer.id, &customer.token)
                .await
                .map(|cart| cart.item_count())
                .unwrap_or(0),
        },
        None => 0,
    };

    CartCountTemplate { count }
}
