//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use rigbay_core::catalog::{ProductQuery, ProductSort};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use super::products::ProductCard;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Number of products in the featured grid.
const FEATURED_COUNT: u32 = 8;

/// Category tile linking into the filtered listing.
#[derive(Clone)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page: top-rated in-stock products and category tiles.
#[instrument(skip(state, session, customer))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> impl IntoResponse {
    let currency = state.currency();
    let (products, categories) = tokio::join!(
        state.commerce().list_products(),
        state.commerce().list_categories()
    );

    let featured_query = ProductQuery {
        sort: ProductSort::Rating,
        in_stock: true,
        per_page: Some(FEATURED_COUNT),
        ..ProductQuery::default()
    };
    let featured = featured_query
        .apply(&products)
        .items
        .into_iter()
        .map(|p| ProductCard::new(p, currency))
        .collect();

    let categories = categories
        .iter()
        .map(|c| CategoryLink {
            name: c.name.clone(),
            url: format!("/products?category={}", urlencoding::encode(&c.name)),
        })
        .collect();

    HomeTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        featured,
        categories,
    }
}
