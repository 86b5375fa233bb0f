//! Product listing: search, filter, sort and paginate.
//!
//! The commerce API hands back the whole catalog; narrowing it down for a
//! listing page happens here so the storefront and admin agree on the rules.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Product;

/// Default number of products per listing page.
pub const DEFAULT_PER_PAGE: u32 = 12;

/// Upper bound on `per_page` to keep pages renderable.
pub const MAX_PER_PAGE: u32 = 100;

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Keep the order the API returned.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
    Rating,
    Newest,
}

impl ProductSort {
    pub const ALL: [Self; 6] = [
        Self::Featured,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Name,
        Self::Rating,
        Self::Newest,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Name => "name",
            Self::Rating => "rating",
            Self::Newest => "newest",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
            Self::Rating => "Top rated",
            Self::Newest => "Newest",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Featured => Ordering::Equal,
            Self::PriceAsc => none_last(a.min_price(), b.min_price(), |x, y| x.cmp(&y)),
            Self::PriceDesc => none_last(a.min_price(), b.min_price(), |x, y| y.cmp(&x)),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Rating => none_last(a.average_rating, b.average_rating, |x, y| y.total_cmp(&x))
                .then_with(|| b.review_count.cmp(&a.review_count)),
            Self::Newest => none_last(a.created_at, b.created_at, |x, y| y.cmp(&x))
                .then_with(|| b.id.cmp(&a.id)),
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or_else(|| format!("invalid sort: {s}"))
    }
}

/// Order `Some` before `None`, comparing present values with `cmp`.
fn none_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A listing request. Blank strings are treated as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring over name, category and brand.
    #[serde(default)]
    pub search: Option<String>,
    /// Category name, matched case-insensitively.
    #[serde(default)]
    pub category: Option<String>,
    /// Brand name, matched case-insensitively.
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number, clamped into range.
    pub page: u32,
    pub per_page: u32,
    pub total_items: usize,
    /// At least 1, even for an empty result.
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

impl ProductQuery {
    /// Whether a product passes the search and filters (ignores paging).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = non_blank(self.search.as_deref()) {
            let hit = [product.name.as_str(), product.category_name(), product.brand_name()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(category) = non_blank(self.category.as_deref())
            && product.category_name().to_lowercase() != category
        {
            return false;
        }
        if let Some(brand) = non_blank(self.brand.as_deref())
            && product.brand_name().to_lowercase() != brand
        {
            return false;
        }
        !self.in_stock || product.in_stock()
    }

    /// Filter, sort and paginate.
    ///
    /// Sorting is stable, so `Featured` (and ties) keep the API order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Page<&'a Product> {
        let mut matched: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));

        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let total_items = matched.len();
        let total_pages = u32::try_from(total_items.div_ceil(per_page as usize))
            .unwrap_or(u32::MAX)
            .max(1);
        let page = self.page.unwrap_or(1).clamp(1, total_pages);

        let start = (page - 1) as usize * per_page as usize;
        let items = matched
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Page {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(id: i64, name: &str, category: &str, brand: &str, price: &str, stock: i64) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "category": category,
            "brand": brand,
            "variants": [{"id": id * 10, "sku": format!("SKU-{id}"), "price": price, "stock": stock}],
        }))
        .unwrap()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Ryzen 7 7800X3D", "Processors", "AMD", "139000", 3),
            product(2, "Core i5-14600K", "Processors", "Intel", "99000", 0),
            product(3, "GeForce RTX 4070", "Graphics Cards", "NVIDIA", "215000", 2),
            product(4, "B650 Tomahawk", "Motherboards", "MSI", "76000", 5),
            product(5, "Radeon RX 7800 XT", "Graphics Cards", "AMD", "189000", 1),
        ]
    }

    fn ids(page: &Page<&Product>) -> Vec<i64> {
        page.items.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_search_matches_name_category_and_brand() {
        let products = catalog();
        let by_brand = ProductQuery {
            search: Some("amd".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_brand.apply(&products)), vec![1, 5]);

        let by_category = ProductQuery {
            search: Some("  GRAPHICS ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_category.apply(&products)), vec![3, 5]);
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let products = catalog();
        let query = ProductQuery {
            search: Some(String::new()),
            category: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(query.apply(&products).total_items, 5);
    }

    #[test]
    fn test_category_brand_and_stock_filters() {
        let products = catalog();
        let query = ProductQuery {
            category: Some("processors".into()),
            in_stock: true,
            ..Default::default()
        };
        assert_eq!(ids(&query.apply(&products)), vec![1]);

        let query = ProductQuery {
            brand: Some("AMD".into()),
            category: Some("Graphics Cards".into()),
            ..Default::default()
        };
        assert_eq!(ids(&query.apply(&products)), vec![5]);
    }

    #[test]
    fn test_sort_orders() {
        let products = catalog();
        let sorted = |sort| {
            ids(&ProductQuery {
                sort,
                ..Default::default()
            }
            .apply(&products))
        };
        assert_eq!(sorted(ProductSort::Featured), vec![1, 2, 3, 4, 5]);
        assert_eq!(sorted(ProductSort::PriceAsc), vec![4, 2, 1, 5, 3]);
        assert_eq!(sorted(ProductSort::PriceDesc), vec![3, 5, 1, 2, 4]);
        assert_eq!(sorted(ProductSort::Name), vec![4, 2, 3, 5, 1]);
        assert_eq!(sorted(ProductSort::Newest), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_pagination_clamps_page() {
        let products = catalog();
        let query = ProductQuery {
            per_page: Some(2),
            page: Some(9),
            ..Default::default()
        };
        let page = query.apply(&products);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);
        assert_eq!(ids(&page), vec![5]);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let query = ProductQuery {
            search: Some("floppy".into()),
            page: Some(0),
            ..Default::default()
        };
        let products = catalog();
        let page = query.apply(&products);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("price-desc".parse::<ProductSort>(), Ok(ProductSort::PriceDesc));
        assert!("cheapest".parse::<ProductSort>().is_err());
    }
}
