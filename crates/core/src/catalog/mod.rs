//! Records exchanged with the commerce API.
//!
//! The commerce API owns products, carts, orders and users; these types are
//! the JSON shapes it speaks (camelCase on the wire). A few fields come back
//! in more than one shape depending on the endpoint (`category` as a bare name
//! or an `{id, name}` object, images as URLs or objects), so those are
//! normalized on deserialize.

mod query;

pub use query::{Page, ProductQuery, ProductSort};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    BrandId, CartItemId, CategoryId, OrderId, OrderStatus, ProductId, UserId, VariantId,
};

// =============================================================================
// Shared fragments
// =============================================================================

/// Reference to a named entity that may arrive as `"AMD"` or `{"id": 3, "name": "AMD"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "NamedRefRepr<Id>",
    bound(deserialize = "Id: Deserialize<'de>")
)]
pub struct NamedRef<Id> {
    pub id: Option<Id>,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NamedRefRepr<Id> {
    Name(String),
    Full { id: Option<Id>, name: String },
}

impl<Id> From<NamedRefRepr<Id>> for NamedRef<Id> {
    fn from(repr: NamedRefRepr<Id>) -> Self {
        match repr {
            NamedRefRepr::Name(name) => Self { id: None, name },
            NamedRefRepr::Full { id, name } => Self { id, name },
        }
    }
}

pub type CategoryRef = NamedRef<CategoryId>;
pub type BrandRef = NamedRef<BrandId>;

/// Product image, sent either as a bare URL or as `{url, alt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ImageRepr")]
pub struct ProductImage {
    pub url: String,
    pub alt: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageRepr {
    Url(String),
    Full {
        url: String,
        #[serde(default, alias = "altText")]
        alt: Option<String>,
    },
}

impl From<ImageRepr> for ProductImage {
    fn from(repr: ImageRepr) -> Self {
        match repr {
            ImageRepr::Url(url) => Self { url, alt: None },
            ImageRepr::Full { url, alt } => Self { url, alt },
        }
    }
}

/// Free-form variant attributes (`{"color": "black", "capacity": "1TB"}`).
pub type Attributes = BTreeMap<String, serde_json::Value>;

// =============================================================================
// Catalog
// =============================================================================

/// A purchasable SKU of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Variant {
    /// Negative stock from the API is treated as sold out.
    #[must_use]
    pub fn available(&self) -> i64 {
        self.stock.max(0)
    }
}

/// A catalog product with its variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub brand: Option<BrandRef>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub total_stock: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Total units available across variants.
    ///
    /// Uses the API's `totalStock` when present, otherwise sums the variants.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        self.total_stock
            .unwrap_or_else(|| self.variants.iter().map(Variant::available).sum())
            .max(0)
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.total_stock() > 0
    }

    /// The variant shown by default: the first one in stock, else the first one.
    #[must_use]
    pub fn primary_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.stock > 0)
            .or_else(|| self.variants.first())
    }

    /// Lowest and highest variant price.
    #[must_use]
    pub fn price_range(&self) -> Option<(Decimal, Decimal)> {
        let mut prices = self.variants.iter().map(|v| v.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    #[must_use]
    pub fn min_price(&self) -> Option<Decimal> {
        self.price_range().map(|(lo, _)| lo)
    }

    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map_or("", |c| c.name.as_str())
    }

    #[must_use]
    pub fn brand_name(&self) -> &str {
        self.brand.as_ref().map_or("", |b| b.name.as_str())
    }

    #[must_use]
    pub fn featured_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Variant payload for product create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    pub sku: String,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub attributes: Attributes,
}

impl From<&Variant> for VariantInput {
    fn from(variant: &Variant) -> Self {
        Self {
            id: Some(variant.id),
            sku: variant.sku.clone(),
            price: variant.price,
            stock: variant.stock,
            attributes: variant.attributes.clone(),
        }
    }
}

/// Product payload for `POST /api/products` and `PUT /api/products/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub brand_id: BrandId,
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub images: Vec<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// Product snapshot embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub brand: Option<BrandRef>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

/// Variant snapshot embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartVariant {
    pub id: VariantId,
    #[serde(default)]
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: Attributes,
    pub product: CartProduct,
}

/// A line in the customer's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub variant: CartVariant,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.variant.price * Decimal::from(self.quantity)
    }

    /// Whether the requested quantity exceeds what is in stock.
    #[must_use]
    pub fn exceeds_stock(&self) -> bool {
        i64::from(self.quantity) > self.variant.stock.max(0)
    }
}

/// The cart as returned by every cart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Body for `POST /api/cart/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Body for `PUT /api/cart/items/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<ProductImage>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Address an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    pub postal_code: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// How an order was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub method: String,
    pub status: String,
    pub amount: Decimal,
}

/// Who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A placed order. Read-only from Rigbay's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment: Option<PaymentSummary>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Order total: the API's figure when present, else the sum of lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total_amount
            .unwrap_or_else(|| self.items.iter().map(OrderItem::line_total).sum())
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Server-side pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

/// One page of `GET /api/user/orders`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Filters for `GET /api/user/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Customer,
}
