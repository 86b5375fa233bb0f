//! Product route handlers.
//!
//! The listing filters the cached catalog locally. Its search box swaps only
//! the results fragment and uses `hx-sync="this:replace"`, so a newer
//! keystroke aborts the older in-flight request and the page never renders
//! stale results.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use rigbay_core::catalog::{Product, ProductQuery, ProductSort, Variant};
use rigbay_core::{CurrencyCode, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, is_htmx, money};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Number of related products shown under a product.
const RELATED_LIMIT: usize = 4;

// =============================================================================
// View Types
// =============================================================================

/// Product card for grids.
#[derive(Clone)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub image: Option<ImageView>,
    pub in_stock: bool,
    pub rating: Option<String>,
    pub review_count: u32,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Variant display data for templates.
#[derive(Clone)]
pub struct VariantView {
    pub id: i64,
    pub label: String,
    pub sku: String,
    pub price: String,
    pub stock: i64,
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub images: Vec<ImageView>,
    pub variants: Vec<VariantView>,
    pub in_stock: bool,
    pub total_stock: i64,
    pub rating: Option<String>,
    pub review_count: u32,
}

/// Price label: one price, or `from - to` across variants.
fn price_label(product: &Product, currency: CurrencyCode) -> String {
    match product.price_range() {
        Some((low, high)) if low == high => money(low, currency),
        Some((low, high)) => format!("{} - {}", money(low, currency), money(high, currency)),
        None => "Unavailable".to_string(),
    }
}

fn image_views(product: &Product) -> Vec<ImageView> {
    product
        .images
        .iter()
        .map(|img| ImageView {
            url: img.url.clone(),
            alt: img.alt.clone().unwrap_or_else(|| product.name.clone()),
        })
        .collect()
}

fn rating_label(product: &Product) -> Option<String> {
    product
        .average_rating
        .filter(|_| product.review_count > 0)
        .map(|r| format!("{r:.1}"))
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            brand: product.brand_name().to_string(),
            category: product.category_name().to_string(),
            price: price_label(product, currency),
            image: image_views(product).into_iter().next(),
            in_stock: product.in_stock(),
            rating: rating_label(product),
            review_count: product.review_count,
        }
    }
}

impl VariantView {
    fn new(variant: &Variant, currency: CurrencyCode) -> Self {
        let attributes: Vec<String> = variant
            .attributes
            .values()
            .filter_map(|v| match v {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect();
        let label = if attributes.is_empty() {
            variant.sku.clone()
        } else {
            attributes.join(" / ")
        };
        Self {
            id: variant.id.as_i64(),
            label,
            sku: variant.sku.clone(),
            price: money(variant.price, currency),
            stock: variant.available(),
        }
    }
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            brand: product.brand_name().to_string(),
            category: product.category_name().to_string(),
            price: price_label(product, currency),
            images: image_views(product),
            variants: product
                .variants
                .iter()
                .map(|v| VariantView::new(v, currency))
                .collect(),
            in_stock: product.in_stock(),
            total_stock: product.total_stock(),
            rating: rating_label(product),
            review_count: product.review_count,
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Listing query parameters exactly as the filter form sends them.
///
/// Everything is a string so a blank `sort=` or a checkbox's `on` never
/// rejects the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sort: Option<String>,
    pub in_stock: Option<String>,
    pub page: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListingParams {
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        ProductQuery {
            search: non_blank(self.search.as_ref()),
            category: non_blank(self.category.as_ref()),
            brand: non_blank(self.brand.as_ref()),
            sort: self
                .sort
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            in_stock: self.in_stock.is_some(),
            page: self.page.as_deref().and_then(|p| p.trim().parse().ok()),
            per_page: None,
        }
    }

    /// Listing URL for another page with the same filters.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let query = self.to_query();
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(search) = query.search {
            pairs.push(("search", search));
        }
        if let Some(category) = query.category {
            pairs.push(("category", category));
        }
        if let Some(brand) = query.brand {
            pairs.push(("brand", brand));
        }
        if query.sort != ProductSort::Featured {
            pairs.push(("sort", query.sort.as_str().to_string()));
        }
        if query.in_stock {
            pairs.push(("in_stock", "on".to_string()));
        }
        pairs.push(("page", page.to_string()));

        let encoded: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!("/products?{}", encoded.join("&"))
    }
}

/// Sort dropdown option.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One page of listing results.
#[derive(Clone)]
pub struct ListingView {
    pub products: Vec<ProductCard>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub listing: ListingView,
    pub search: String,
    pub category: String,
    pub brand: String,
    pub in_stock: bool,
    pub sorts: Vec<SortOption>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

/// Listing results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_results.html")]
pub struct ProductResultsTemplate {
    pub listing: ListingView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub related: Vec<ProductCard>,
}

/// Display product listing page, or just the results for HTMX requests.
#[instrument(skip(state, session, customer, headers))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    headers: HeaderMap,
    Query(params): Query<ListingParams>,
) -> Response {
    let currency = state.currency();
    let products = state.commerce().list_products().await;
    let query = params.to_query();
    let page = query.apply(&products);

    let listing = ListingView {
        products: page
            .items
            .iter()
            .map(|p| ProductCard::new(p, currency))
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
        prev_url: page.has_prev().then(|| params.page_url(page.page - 1)),
        next_url: page.has_next().then(|| params.page_url(page.page + 1)),
    };

    if is_htmx(&headers) {
        return ProductResultsTemplate { listing }.into_response();
    }

    let (categories, brands) = state.commerce().filter_options().await;

    ProductsIndexTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        listing,
        search: query.search.unwrap_or_default(),
        category: query.category.unwrap_or_default(),
        brand: query.brand.unwrap_or_default(),
        in_stock: query.in_stock,
        sorts: ProductSort::ALL
            .iter()
            .map(|sort| SortOption {
                value: sort.as_str(),
                label: sort.label(),
                selected: *sort == query.sort,
            })
            .collect(),
        categories: categories.iter().map(|c| c.name.clone()).collect(),
        brands: brands.iter().map(|b| b.name.clone()).collect(),
    }
    .into_response()
}

/// Display product detail page.
#[instrument(skip(state, session, customer), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let currency = state.currency();
    let product = state.commerce().get_product(id).await?;

    let related = state
        .commerce()
        .list_products()
        .await
        .iter()
        .filter(|p| p.id != product.id && p.category_name() == product.category_name())
        .take(RELATED_LIMIT)
        .map(|p| ProductCard::new(p, currency))
        .collect();

    Ok(ProductShowTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        product: ProductView::new(&product, currency),
        related,
    })
}
