//! Storefront services.
//!
//! - [`cart`] - Per-customer cart state over the commerce API
//! - [`builder`] - PC Builder catalog and rules

pub mod builder;
pub mod cart;

pub use builder::{CatalogLoadError, PcBuilder};
pub use cart::{CartOp, CartSessions};
