//! Account route handlers.
//!
//! These routes require authentication. Order history is paginated by the
//! commerce API; the page renders whatever pagination metadata it returns.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rigbay_core::catalog::{Order, OrderQuery, Pagination};
use rigbay_core::{CurrencyCode, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, money, set_flash};
use crate::commerce::CommerceError;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, clear_current_customer, login_url};
use crate::state::AppState;

/// Orders per page.
const ORDERS_PER_PAGE: u32 = 10;

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub placed_on: String,
    pub item_count: u32,
    pub total: String,
    pub items: Vec<OrderItemView>,
    pub ship_to: Option<String>,
    pub payment: Option<String>,
}

impl OrderView {
    fn new(order: &Order, currency: CurrencyCode) -> Self {
        Self {
            number: order.order_number.clone(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            item_count: order.item_count(),
            total: money(order.total(), currency),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.product_name.clone(),
                    sku: item.sku.clone().unwrap_or_default(),
                    quantity: item.quantity,
                    price: money(item.price, currency),
                    line_total: money(item.line_total(), currency),
                })
                .collect(),
            ship_to: order.shipping_address.as_ref().map(|a| {
                format!(
                    "{} {}, {}, {}",
                    a.first_name, a.last_name, a.address_line1, a.city
                )
            }),
            payment: order
                .payment
                .as_ref()
                .map(|p| format!("{} ({})", p.method, p.status)),
        }
    }
}

/// Status filter option.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Pagination display data for templates.
#[derive(Clone)]
pub struct PageLinks {
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Order history query parameters as the filter form sends them.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrdersParams {
    pub page: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl OrdersParams {
    #[must_use]
    pub fn to_query(&self) -> OrderQuery {
        OrderQuery {
            page: Some(
                self.page
                    .as_deref()
                    .and_then(|p| p.trim().parse().ok())
                    .filter(|p: &u32| *p >= 1)
                    .unwrap_or(1),
            ),
            limit: Some(ORDERS_PER_PAGE),
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }

    fn page_url(&self, page: u32) -> String {
        let query = self.to_query();
        let mut url = format!("/account/orders?page={page}");
        if let Some(status) = query.status {
            url.push_str("&status=");
            url.push_str(status.as_str());
        }
        if let Some(search) = query.search {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(&search));
        }
        url
    }

    fn links(&self, pagination: &Pagination) -> PageLinks {
        PageLinks {
            page: pagination.page,
            total_pages: pagination.total_pages.max(1),
            total: pagination.total,
            prev_url: pagination
                .has_prev()
                .then(|| self.page_url(pagination.page - 1)),
            next_url: pagination
                .has_next()
                .then(|| self.page_url(pagination.page + 1)),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub links: PageLinks,
    pub statuses: Vec<StatusOption>,
    pub search: String,
    pub filtered: bool,
    pub error: Option<String>,
}

/// Display order history.
///
/// An expired customer token signs the customer out and sends them to log in
/// again; any other API failure renders the page with an inline error.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Query(params): Query<OrdersParams>,
) -> Result<Response> {
    let currency = state.currency();
    let query = params.to_query();

    let (page, error) = match state.commerce().list_orders(&customer.token, &query).await {
        Ok(page) => (page, None),
        Err(CommerceError::Unauthorized) => {
            clear_current_customer(&session).await?;
            state.carts().forget(customer.id).await;
            set_flash(&session, "Your session has expired. Please sign in again.").await;
            return Ok(Redirect::to(&login_url("/account/orders")).into_response());
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (
                rigbay_core::catalog::OrderPage::default(),
                Some("We couldn't load your orders right now. Please try again.".to_string()),
            )
        }
    };

    let statuses = OrderStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: query.status == Some(*status),
        })
        .collect();

    Ok(OrdersTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        orders: page
            .orders
            .iter()
            .map(|o| OrderView::new(o, currency))
            .collect(),
        links: params.links(&page.pagination),
        statuses,
        filtered: query.status.is_some() || query.search.is_some(),
        search: query.search.unwrap_or_default(),
        error,
    }
    .into_response())
}
