//! Product create/edit form.
//!
//! The panel edits one variant per product: the primary one. A product with
//! several variants keeps the others untouched when it is saved.

use std::str::FromStr;

use rigbay_core::catalog::{Attributes, Product, ProductInput, VariantInput};
use rigbay_core::checkout::FieldErrors;
use rigbay_core::{BrandId, CategoryId, VariantId};
use rust_decimal::Decimal;
use serde::Deserialize;

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 5000;
const SKU_MAX: usize = 64;

/// Raw product form fields as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub brand_id: String,
    /// Id of the variant being edited; empty for a new product.
    #[serde(default)]
    pub variant_id: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    /// Image URLs, one per line.
    #[serde(default)]
    pub images: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        let variant = product.primary_variant();
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            category_id: product
                .category
                .as_ref()
                .and_then(|c| c.id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            brand_id: product
                .brand
                .as_ref()
                .and_then(|b| b.id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            variant_id: variant.map(|v| v.id.to_string()).unwrap_or_default(),
            sku: variant.map(|v| v.sku.clone()).unwrap_or_default(),
            price: variant.map(|v| v.price.to_string()).unwrap_or_default(),
            stock: variant.map(|v| v.stock.to_string()).unwrap_or_default(),
            images: product
                .images
                .iter()
                .map(|image| image.url.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl ProductForm {
    /// Validate the form into an API payload.
    ///
    /// `existing` is the product being edited. Its variants other than the
    /// edited one are carried over unchanged, in their original order.
    ///
    /// # Errors
    ///
    /// Returns every field problem at once.
    pub fn validate(&self, existing: Option<&Product>) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", "Name is required");
        } else if name.chars().count() > NAME_MAX {
            errors.insert("name", format!("Name must be at most {NAME_MAX} characters"));
        }

        let description = self.description.trim();
        if description.chars().count() > DESCRIPTION_MAX {
            errors.insert(
                "description",
                format!("Description must be at most {DESCRIPTION_MAX} characters"),
            );
        }

        let category_id = parse_id::<CategoryId>(&self.category_id);
        if category_id.is_none() {
            errors.insert("category_id", "Choose a category");
        }
        let brand_id = parse_id::<BrandId>(&self.brand_id);
        if brand_id.is_none() {
            errors.insert("brand_id", "Choose a brand");
        }

        let sku = self.sku.trim();
        if sku.is_empty() {
            errors.insert("sku", "SKU is required");
        } else if sku.len() > SKU_MAX || sku.chars().any(char::is_whitespace) {
            errors.insert(
                "sku",
                format!("SKU must be at most {SKU_MAX} characters with no spaces"),
            );
        }

        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(message) => {
                errors.insert("price", message);
                None
            }
        };

        let stock = match self.stock.trim().parse::<i64>() {
            Ok(stock) if stock >= 0 => Some(stock),
            Ok(_) => {
                errors.insert("stock", "Stock cannot be negative");
                None
            }
            Err(_) => {
                errors.insert("stock", "Stock must be a whole number");
                None
            }
        };

        let images: Vec<String> = self
            .images
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        if images.iter().any(|url| !is_image_url(url)) {
            errors.insert("images", "Image URLs must start with https://, http:// or /");
        }

        let (Some(category_id), Some(brand_id), Some(price), Some(stock)) =
            (category_id, brand_id, price, stock)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let edited_id = parse_id::<VariantId>(&self.variant_id);
        let edited = |id: Option<VariantId>, attributes: Attributes| VariantInput {
            id,
            sku: sku.to_string(),
            price,
            stock,
            attributes,
        };

        let existing_variants = existing.map_or(&[][..], |p| p.variants.as_slice());
        let mut variants = Vec::with_capacity(existing_variants.len().max(1));
        let mut replaced = false;
        for variant in existing_variants {
            if Some(variant.id) == edited_id {
                variants.push(edited(Some(variant.id), variant.attributes.clone()));
                replaced = true;
            } else {
                variants.push(VariantInput::from(variant));
            }
        }
        if !replaced {
            variants.insert(0, edited(None, Attributes::new()));
        }

        Ok(ProductInput {
            name: name.to_string(),
            description: description.to_string(),
            category_id,
            brand_id,
            variants,
            images,
        })
    }
}

fn parse_id<T>(value: &str) -> Option<T>
where
    T: FromStr + Copy + Into<i64>,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|id| Into::<i64>::into(*id) > 0)
}

fn parse_price(value: &str) -> Result<Decimal, &'static str> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err("Price is required");
    }
    let price = Decimal::from_str(&cleaned).map_err(|_| "Price must be a number")?;
    if price.is_sign_negative() {
        return Err("Price cannot be negative");
    }
    if price.scale() > 2 {
        return Err("Price can have at most 2 decimal places");
    }
    Ok(price)
}

fn is_image_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')
}
