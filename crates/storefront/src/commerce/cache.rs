//! Cache types for commerce API responses.

use std::sync::Arc;

use rigbay_core::catalog::{Brand, Category, Product};
use rigbay_core::ProductId;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
    Brands(Arc<Vec<Brand>>),
}
