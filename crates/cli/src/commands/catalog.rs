//! Catalog commands against the commerce API.
//!
//! # Usage
//!
//! ```bash
//! # List products, filtered the same way the storefront filters them
//! rigbay catalog products --search ryzen --sort price-asc
//!
//! # Create products from a seed file
//! rigbay catalog seed seed/products.yaml
//!
//! # Validate a seed file without writing anything
//! rigbay catalog seed seed/products.yaml --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `COMMERCE_API_URL` - Base URL of the commerce API
//! - `ADMIN_API_TOKEN` - Admin bearer token (validated for strength)
//! - `COMMERCE_API_TIMEOUT_SECS` - Request timeout, default 10

use std::collections::HashSet;
use std::path::Path;

use rigbay_admin::commerce::AdminCommerceClient;
use rigbay_admin::config::AdminCommerceConfig;
use rigbay_core::catalog::{
    Attributes, Brand, Category, ProductInput, ProductQuery, ProductSort, VariantInput,
};
use rigbay_core::{BrandId, CategoryId, CurrencyCode, Price};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use super::read_document;
use crate::error::CliError;

/// Products shown per page of `catalog products`.
const LIST_PAGE_SIZE: u32 = 50;

/// A seed file.
///
/// ```yaml
/// products:
///   - name: GeForce RTX 4070 Super
///     category: Graphics Cards
///     brand: NVIDIA
///     images: [https://cdn.example.com/4070s.jpg]
///     variants:
///       - { sku: GPU-4070S, price: 189500, stock: 6 }
/// ```
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<SeedProduct>,
}

/// One product in a seed file. Category and brand are matched by name or id.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
pub struct SeedVariant {
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub failed: Vec<(String, String)>,
}

/// Filters for `catalog products`.
#[derive(Debug, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sort: ProductSort,
    pub page: Option<u32>,
}

fn client_from_env() -> Result<AdminCommerceClient, CliError> {
    dotenvy::dotenv().ok();
    let config = AdminCommerceConfig::from_env()?;
    info!(api_url = %config.api_url, "Using commerce API");
    Ok(AdminCommerceClient::new(&config)?)
}

/// List products from the commerce API.
///
/// # Errors
///
/// Returns an error if configuration is missing or every product endpoint
/// fails.
pub async fn products(options: ListOptions, currency: CurrencyCode) -> Result<(), CliError> {
    let client = client_from_env()?;
    for line in product_lines(&client, options, currency).await? {
        info!("{line}");
    }
    Ok(())
}

async fn product_lines(
    client: &AdminCommerceClient,
    options: ListOptions,
    currency: CurrencyCode,
) -> Result<Vec<String>, CliError> {
    let products = client.list_products().await?;
    let query = ProductQuery {
        search: options.search,
        category: options.category,
        brand: options.brand,
        sort: options.sort,
        in_stock: false,
        page: options.page,
        per_page: Some(LIST_PAGE_SIZE),
    };
    let page = query.apply(&products);

    let mut lines: Vec<String> = page
        .items
        .iter()
        .map(|product| {
            let price = product
                .min_price()
                .map_or_else(|| "-".to_string(), |p| Price::new(p, currency).display());
            format!(
                "#{:<6} {:<40} {:<16} {:<12} {:>14}  stock {}",
                product.id,
                product.name,
                product.category_name(),
                product.brand_name(),
                price,
                product.total_stock()
            )
        })
        .collect();
    lines.push(format!(
        "{} product(s), page {} of {}",
        page.total_items, page.page, page.total_pages
    ));
    Ok(lines)
}

/// Create every product in a seed file.
///
/// The whole file is validated against the API's categories and brands
/// before anything is written.
///
/// # Errors
///
/// Returns an error if the file is invalid or any product fails to create.
pub async fn seed(path: &Path, dry_run: bool) -> Result<(), CliError> {
    info!(path = %path.display(), "Loading seed file");
    let file: SeedFile = read_document(path).await?;
    info!(products = file.products.len(), "Parsed seed file");

    let client = client_from_env()?;
    let report = seed_with(&client, file, dry_run).await?;

    info!("Seeding complete!");
    info!("  Products created: {}", report.created);
    if report.failed.is_empty() {
        return Ok(());
    }
    error!("  Failures: {}", report.failed.len());
    for (name, err) in &report.failed {
        error!("    - {name}: {err}");
    }
    Err(CliError::SeedFailed(report.failed.len()))
}

async fn seed_with(
    client: &AdminCommerceClient,
    file: SeedFile,
    dry_run: bool,
) -> Result<SeedReport, CliError> {
    let (categories, brands) = client.form_options().await;
    let inputs = match resolve(file, &categories, &brands) {
        Ok(inputs) => inputs,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(CliError::InvalidSeed(errors.len()));
        }
    };
    info!(products = inputs.len(), "Seed file validated");

    let mut report = SeedReport::default();
    if dry_run {
        info!("Dry run, nothing written");
        return Ok(report);
    }

    for input in inputs {
        match client.create_product(&input).await {
            Ok(product) => {
                info!(id = %product.id, name = %product.name, "Created product");
                report.created += 1;
            }
            Err(e) => {
                let message = e
                    .user_message()
                    .map_or_else(|| e.to_string(), String::from);
                report.failed.push((input.name, message));
            }
        }
    }
    Ok(report)
}

/// Turn a seed file into API payloads, collecting every problem.
fn resolve(
    file: SeedFile,
    categories: &[Category],
    brands: &[Brand],
) -> Result<Vec<ProductInput>, Vec<String>> {
    let mut errors = Vec::new();
    let mut skus = HashSet::new();
    let mut inputs = Vec::with_capacity(file.products.len());

    for (position, product) in file.products.into_iter().enumerate() {
        let label = if product.name.trim().is_empty() {
            format!("product #{}", position + 1)
        } else {
            product.name.trim().to_string()
        };

        if product.name.trim().is_empty() {
            errors.push(format!("{label}: name is required"));
        }
        let category_id = find_category(categories, &product.category);
        if category_id.is_none() {
            errors.push(format!("{label}: unknown category {:?}", product.category));
        }
        let brand_id = find_brand(brands, &product.brand);
        if brand_id.is_none() {
            errors.push(format!("{label}: unknown brand {:?}", product.brand));
        }
        if product.variants.is_empty() {
            errors.push(format!("{label}: at least one variant is required"));
        }
        for variant in &product.variants {
            let sku = variant.sku.trim();
            if sku.is_empty() {
                errors.push(format!("{label}: variant SKU is required"));
            } else if !skus.insert(sku.to_ascii_uppercase()) {
                errors.push(format!("{label}: duplicate SKU {sku}"));
            }
            if variant.price.is_sign_negative() {
                errors.push(format!("{label}: {sku} has a negative price"));
            }
            if variant.stock < 0 {
                errors.push(format!("{label}: {sku} has negative stock"));
            }
        }

        if let (Some(category_id), Some(brand_id)) = (category_id, brand_id) {
            inputs.push(ProductInput {
                name: product.name.trim().to_string(),
                description: product.description.trim().to_string(),
                category_id,
                brand_id,
                variants: product
                    .variants
                    .into_iter()
                    .map(|v| VariantInput {
                        id: None,
                        sku: v.sku.trim().to_string(),
                        price: v.price,
                        stock: v.stock,
                        attributes: v.attributes,
                    })
                    .collect(),
                images: product.images,
            });
        }
    }

    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(errors)
    }
}

fn find_category(categories: &[Category], key: &str) -> Option<CategoryId> {
    let key = key.trim();
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(key) || c.id.to_string() == key)
        .map(|c| c.id)
}

fn find_brand(brands: &[Brand], key: &str) -> Option<BrandId> {
    let key = key.trim();
    brands
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(key) || b.id.to_string() == key)
        .map(|b| b.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn client(server: &MockServer) -> AdminCommerceClient {
        AdminCommerceClient::new(&AdminCommerceConfig {
            api_url: url::Url::parse(&format!("{}/", server.uri())).unwrap(),
            api_token: SecretString::from(TOKEN),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mock_lookups(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 3, "name": "Graphics Cards"},
                {"id": 4, "name": "Memory"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/brands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 5, "name": "NVIDIA"},
                {"id": 9, "name": "Corsair"}
            ])))
            .mount(server)
            .await;
    }

    fn seed_file(yaml: &str) -> SeedFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    const TWO_PRODUCTS: &str = r"
products:
  - name: GeForce RTX 4070 Super
    category: graphics cards
    brand: NVIDIA
    variants:
      - { sku: GPU-4070S, price: 189500, stock: 6 }
  - name: Vengeance DDR5
    category: '4'
    brand: Corsair
    variants:
      - { sku: RAM-32, price: 38000, stock: 4, attributes: { capacity: 32GB } }
      - { sku: RAM-64, price: 72000 }
";

    #[test]
    fn test_resolve_matches_names_and_ids() {
        let categories: Vec<Category> = serde_json::from_value(json!([
            {"id": 3, "name": "Graphics Cards"}, {"id": 4, "name": "Memory"}
        ]))
        .unwrap();
        let brands: Vec<Brand> = serde_json::from_value(json!([
            {"id": 5, "name": "NVIDIA"}, {"id": 9, "name": "Corsair"}
        ]))
        .unwrap();

        let inputs = resolve(seed_file(TWO_PRODUCTS), &categories, &brands).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].category_id, CategoryId::new(3));
        assert_eq!(inputs[1].category_id, CategoryId::new(4));
        assert_eq!(inputs[1].brand_id, BrandId::new(9));
        assert_eq!(inputs[1].variants.len(), 2);
        assert_eq!(inputs[1].variants[1].stock, 0);
    }

    #[test]
    fn test_resolve_collects_every_error() {
        let yaml = r"
products:
  - name: ''
    category: Sound Cards
    brand: Creative
  - name: Twin A
    category: Memory
    brand: Corsair
    variants: [{ sku: dup-1, price: 10 }]
  - name: Twin B
    category: Memory
    brand: Corsair
    variants: [{ sku: DUP-1, price: -1, stock: -2 }]
";
        let categories: Vec<Category> =
            serde_json::from_value(json!([{"id": 4, "name": "Memory"}])).unwrap();
        let brands: Vec<Brand> =
            serde_json::from_value(json!([{"id": 9, "name": "Corsair"}])).unwrap();

        let errors = resolve(seed_file(yaml), &categories, &brands).unwrap_err();
        assert!(errors.contains(&"product #1: name is required".to_string()));
        assert!(errors.iter().any(|e| e.contains("unknown category \"Sound Cards\"")));
        assert!(errors.iter().any(|e| e.contains("unknown brand")));
        assert!(errors.contains(&"product #1: at least one variant is required".to_string()));
        assert!(errors.contains(&"Twin B: duplicate SKU DUP-1".to_string()));
        assert!(errors.contains(&"Twin B: DUP-1 has a negative price".to_string()));
        assert!(errors.contains(&"Twin B: DUP-1 has negative stock".to_string()));
    }

    #[tokio::test]
    async fn test_seed_creates_products() {
        let server = MockServer::start().await;
        mock_lookups(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .and(body_partial_json(json!({"name": "GeForce RTX 4070 Super", "categoryId": 3})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 41, "name": "GeForce RTX 4070 Super",
                "variants": [{"id": 400, "sku": "GPU-4070S", "price": 189500, "stock": 6}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .and(body_partial_json(json!({"name": "Vengeance DDR5"})))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "SKU RAM-32 already exists"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let report = seed_with(&client(&server), seed_file(TWO_PRODUCTS), false)
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(
            report.failed,
            vec![(
                "Vengeance DDR5".to_string(),
                "SKU RAM-32 already exists".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_seed_dry_run_writes_nothing() {
        let server = MockServer::start().await;
        mock_lookups(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let report = seed_with(&client(&server), seed_file(TWO_PRODUCTS), true)
            .await
            .unwrap();
        assert_eq!(report, SeedReport::default());
    }

    #[tokio::test]
    async fn test_seed_aborts_when_lookups_missing() {
        // Lookup endpoints fail, so no category resolves and nothing is posted.
        let server = MockServer::start().await;
        let err = seed_with(&client(&server), seed_file(TWO_PRODUCTS), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidSeed(4)));
    }

    #[tokio::test]
    async fn test_product_lines_filter_and_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/fast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Ryzen 5 7600", "category": "CPUs", "brand": "AMD",
                 "variants": [{"id": 10, "sku": "CPU-7600", "price": 62000, "stock": 3}]},
                {"id": 2, "name": "Ryzen 7 7800X3D", "category": "CPUs", "brand": "AMD",
                 "variants": [{"id": 20, "sku": "CPU-7800", "price": 142000, "stock": 0}]},
                {"id": 3, "name": "Core i5-14600K", "category": "CPUs", "brand": "Intel",
                 "variants": [{"id": 30, "sku": "CPU-14600", "price": 98000, "stock": 2}]}
            ])))
            .mount(&server)
            .await;

        let options = ListOptions {
            search: Some("ryzen".to_string()),
            sort: ProductSort::PriceDesc,
            ..ListOptions::default()
        };
        let lines = product_lines(&client(&server), options, CurrencyCode::LKR)
            .await
            .unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Ryzen 7 7800X3D"));
        assert!(lines[1].contains("Ryzen 5 7600"));
        assert_eq!(lines[2], "2 product(s), page 1 of 1");
    }
}
