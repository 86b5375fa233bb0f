//! Product management route handlers.
//!
//! Writes go straight to the commerce API with the admin token. Validation
//! problems re-render the form with every field error; API rejections that
//! carry a message (duplicate SKU and the like) show it above the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rigbay_core::catalog::{Brand, Category, Product, ProductQuery, ProductSort};
use rigbay_core::checkout::FieldErrors;
use rigbay_core::{CurrencyCode, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, money, set_flash};
use crate::commerce::CommerceError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::ProductForm;
use crate::state::AppState;

/// Products per listing page.
const PRODUCTS_PER_PAGE: u32 = 25;

// =============================================================================
// View Types
// =============================================================================

/// Product row for the listing table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub sku: String,
    pub price: String,
    pub stock: i64,
    pub variant_count: usize,
    pub image_url: Option<String>,
}

impl ProductRow {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        let primary = product.primary_variant();
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category_name().to_string(),
            brand: product.brand_name().to_string(),
            sku: primary.map(|v| v.sku.clone()).unwrap_or_default(),
            price: primary.map_or_else(|| "-".to_string(), |v| money(v.price, currency)),
            stock: product.total_stock(),
            variant_count: product.variants.len(),
            image_url: product.featured_image().map(|img| img.url.clone()),
        }
    }
}

/// `<option>` for the category and brand selects.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], selected: &str) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption {
            value: c.id.to_string(),
            label: c.name.clone(),
            selected: c.id.to_string() == selected.trim(),
        })
        .collect()
}

fn brand_options(brands: &[Brand], selected: &str) -> Vec<SelectOption> {
    brands
        .iter()
        .map(|b| SelectOption {
            value: b.id.to_string(),
            label: b.name.clone(),
            selected: b.id.to_string() == selected.trim(),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRow>,
    pub search: String,
    pub page: u32,
    pub total_pages: u32,
    pub total: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub error: Option<String>,
}

/// Create/edit form page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub title: String,
    pub action: String,
    pub product_id: Option<i64>,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub categories: Vec<SelectOption>,
    pub brands: Vec<SelectOption>,
    /// Variants the form doesn't show, which are kept on save.
    pub other_variants: usize,
}

impl ProductFormTemplate {
    async fn load(
        state: &AppState,
        session: &Session,
        product: Option<&Product>,
        form: ProductForm,
    ) -> Self {
        let (categories, brands) = state.commerce().form_options().await;
        let (title, action, product_id) = match product {
            Some(p) => (
                format!("Edit {}", p.name),
                format!("/products/{}", p.id),
                Some(p.id.as_i64()),
            ),
            None => ("New product".to_string(), "/products".to_string(), None),
        };
        Self {
            layout: Layout::load(session).await,
            title,
            action,
            product_id,
            categories: category_options(&categories, &form.category_id),
            brands: brand_options(&brands, &form.brand_id),
            other_variants: product.map_or(0, |p| p.variants.len().saturating_sub(1)),
            form,
            errors: FieldErrors::default(),
            error: None,
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IndexParams {
    pub search: Option<String>,
    pub page: Option<String>,
}

impl IndexParams {
    fn to_query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            sort: ProductSort::Name,
            page: self.page.as_deref().and_then(|p| p.trim().parse().ok()),
            per_page: Some(PRODUCTS_PER_PAGE),
            ..ProductQuery::default()
        }
    }

    fn page_url(&self, page: u32) -> String {
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(search) => format!(
                "/products?page={page}&search={}",
                urlencoding::encode(search)
            ),
            None => format!("/products?page={page}"),
        }
    }
}

/// Products list page handler.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<IndexParams>,
) -> Response {
    let (products, error) = match state.commerce().list_products().await {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            (
                Vec::new(),
                Some("Could not load products from the commerce API.".to_string()),
            )
        }
    };

    let page = params.to_query().apply(&products);
    let currency = state.currency();

    ProductsIndexTemplate {
        layout: Layout::load(&session).await,
        products: page
            .items
            .iter()
            .map(|p| ProductRow::new(p, currency))
            .collect(),
        search: params.search.clone().unwrap_or_default(),
        page: page.page,
        total_pages: page.total_pages,
        total: page.total_items,
        prev_url: page.has_prev().then(|| params.page_url(page.page - 1)),
        next_url: page.has_next().then(|| params.page_url(page.page + 1)),
        error,
    }
    .into_response()
}

// =============================================================================
// Create / Edit
// =============================================================================

/// Blank create form.
pub async fn new(State(state): State<AppState>, session: Session) -> Response {
    ProductFormTemplate::load(&state, &session, None, ProductForm::default())
        .await
        .into_response()
}

/// Create a product.
#[instrument(skip(state, session, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate(None) {
        Ok(input) => input,
        Err(errors) => return Ok(invalid(&state, &session, None, form, errors).await),
    };

    match state.commerce().create_product(&input).await {
        Ok(product) => {
            set_flash(&session, format!("Created \"{}\".", product.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => rejected(&state, &session, None, form, e).await,
    }
}

/// Edit form prefilled from the product's primary variant.
#[instrument(skip(state, session))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.commerce().get_product(id).await?;
    let form = ProductForm::from(&product);
    Ok(ProductFormTemplate::load(&state, &session, Some(&product), form)
        .await
        .into_response())
}

/// Update a product, keeping the variants the form doesn't show.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let product = state.commerce().get_product(id).await?;
    let input = match form.validate(Some(&product)) {
        Ok(input) => input,
        Err(errors) => return Ok(invalid(&state, &session, Some(&product), form, errors).await),
    };

    match state.commerce().update_product(id, &input).await {
        Ok(updated) => {
            set_flash(&session, format!("Saved \"{}\".", updated.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => rejected(&state, &session, Some(&product), form, e).await,
    }
}

/// Delete a product. A product that is already gone counts as deleted.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    match state.commerce().delete_product(id).await {
        Ok(()) => set_flash(&session, "Product deleted.").await,
        Err(CommerceError::NotFound(_)) => {
            tracing::info!(product_id = %id, "Product was already deleted");
            set_flash(&session, "That product no longer exists.").await;
        }
        Err(e) => match e.user_message() {
            Some(message) => {
                set_flash(&session, format!("Couldn't delete the product: {message}")).await;
            }
            None => return Err(AppError::from(e)),
        },
    }
    Ok(Redirect::to("/products").into_response())
}

/// Re-render the form with field errors.
async fn invalid(
    state: &AppState,
    session: &Session,
    product: Option<&Product>,
    form: ProductForm,
    errors: FieldErrors,
) -> Response {
    tracing::debug!(fields = errors.len(), "Product form rejected");
    let mut page = ProductFormTemplate::load(state, session, product, form).await;
    page.errors = errors;
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

/// Re-render the form when the API explains a rejected write; otherwise fail.
async fn rejected(
    state: &AppState,
    session: &Session,
    product: Option<&Product>,
    form: ProductForm,
    error: CommerceError,
) -> Result<Response> {
    let Some(message) = error.user_message().map(String::from) else {
        return Err(AppError::from(error));
    };
    tracing::info!(reason = %message, "Commerce API rejected product write");
    let mut page = ProductFormTemplate::load(state, session, product, form).await;
    page.error = Some(message);
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}
