//! Listing filters and their translation into the Storefront search syntax.
//!
//! Values within one dimension are OR-ed, dimensions are AND-ed. Anything
//! unrecognized is dropped silently; a listing URL never fails to parse.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::shopify::ProductSortKey;

/// Heritage values carried as `heritage:<value>` product tags.
pub const HERITAGE_OPTIONS: &[&str] = &[
    "palestinian",
    "egyptian",
    "syrian",
    "lebanese",
    "moroccan",
    "iraqi",
    "saudi",
    "emirati",
    "jordanian",
    "tunisian",
    "algerian",
    "yemeni",
];

/// Product types used as categories.
pub const CATEGORY_OPTIONS: &[&str] = &[
    "Textiles",
    "Jewelry",
    "Ceramics",
    "Woodwork",
    "Calligraphy",
    "Glass",
    "Metalwork",
    "Leather",
];

pub const DEFAULT_PAGE_SIZE: i64 = 24;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

impl ProductSort {
    /// Parse a `sort` parameter. Unknown values fall back to newest first.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "created-asc" => Self::Oldest,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "title-asc" => Self::TitleAsc,
            "title-desc" => Self::TitleDesc,
            _ => Self::Newest,
        }
    }

    /// `(sortKey, reverse)` for the products query.
    #[must_use]
    pub const fn sort_key(self) -> (ProductSortKey, bool) {
        match self {
            Self::Newest => (ProductSortKey::CreatedAt, true),
            Self::Oldest => (ProductSortKey::CreatedAt, false),
            Self::PriceAsc => (ProductSortKey::Price, false),
            Self::PriceDesc => (ProductSortKey::Price, true),
            Self::TitleAsc => (ProductSortKey::Title, false),
            Self::TitleDesc => (ProductSortKey::Title, true),
        }
    }
}

/// Filters for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilters {
    pub term: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Lowercase heritage values from [`HERITAGE_OPTIONS`], deduplicated.
    pub heritage: Vec<&'static str>,
    /// Canonical categories from [`CATEGORY_OPTIONS`], deduplicated.
    pub category: Vec<&'static str>,
    pub sort: ProductSort,
    pub first: i64,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            term: None,
            min_price: None,
            max_price: None,
            heritage: Vec::new(),
            category: Vec::new(),
            sort: ProductSort::default(),
            first: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductFilters {
    /// Parse a raw query string (`q`, `min`, `max`, `heritage`, `category`,
    /// `sort`, `first`).
    ///
    /// `heritage` and `category` accept comma separated values and may be
    /// repeated.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut filters = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "q" => {
                    let term = value.trim();
                    if !term.is_empty() {
                        filters.term = Some(term.to_string());
                    }
                }
                "min" => filters.min_price = parse_price(&value),
                "max" => filters.max_price = parse_price(&value),
                "heritage" => {
                    for v in value.split(',') {
                        push_unique(&mut filters.heritage, match_option(HERITAGE_OPTIONS, v));
                    }
                }
                "category" => {
                    for v in value.split(',') {
                        push_unique(&mut filters.category, match_option(CATEGORY_OPTIONS, v));
                    }
                }
                "sort" => filters.sort = ProductSort::parse(&value),
                "first" => {
                    filters.first = value
                        .trim()
                        .parse::<i64>()
                        .map_or(DEFAULT_PAGE_SIZE, |n| n.clamp(1, MAX_PAGE_SIZE));
                }
                _ => {}
            }
        }

        filters
    }
}

/// The `query` argument for the products connection, or `None` when no
/// filter is set.
///
/// ```
/// use heritage_storefront::catalog::{ProductFilters, build_search_query};
///
/// let filters = ProductFilters::from_query("heritage=palestinian,egyptian&min=10");
/// assert_eq!(
///     build_search_query(&filters).as_deref(),
///     Some(r#"(tag:"heritage:palestinian" OR tag:"heritage:egyptian") AND price:>=10"#)
/// );
/// ```
#[must_use]
pub fn build_search_query(filters: &ProductFilters) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(term) = &filters.term {
        clauses.push(format!("title:{}", quote(term)));
    }
    if let Some(group) = or_group(
        filters
            .heritage
            .iter()
            .map(|h| format!("tag:{}", quote(&format!("heritage:{h}")))),
    ) {
        clauses.push(group);
    }
    if let Some(group) = or_group(
        filters
            .category
            .iter()
            .map(|c| format!("product_type:{}", quote(c))),
    ) {
        clauses.push(group);
    }
    if let Some(min) = filters.min_price {
        clauses.push(format!("price:>={}", min.normalize()));
    }
    if let Some(max) = filters.max_price {
        clauses.push(format!("price:<={}", max.normalize()));
    }

    (!clauses.is_empty()).then(|| clauses.join(" AND "))
}

fn parse_price(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|d| !d.is_sign_negative())
}

fn match_option(options: &[&'static str], value: &str) -> Option<&'static str> {
    let value = value.trim();
    options
        .iter()
        .copied()
        .find(|option| option.eq_ignore_ascii_case(value))
}

fn push_unique(values: &mut Vec<&'static str>, value: Option<&'static str>) {
    if let Some(value) = value
        && !values.contains(&value)
    {
        values.push(value);
    }
}

fn or_group(terms: impl Iterator<Item = String>) -> Option<String> {
    let terms: Vec<String> = terms.collect();
    (!terms.is_empty()).then(|| format!("({})", terms.join(" OR ")))
}

/// Quote a value as a search-syntax string literal.
fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_has_no_filters() {
        let filters = ProductFilters::from_query("");
        assert_eq!(filters, ProductFilters::default());
        assert_eq!(build_search_query(&filters), None);
        assert_eq!(filters.sort.sort_key(), (ProductSortKey::CreatedAt, true));
    }

    #[test]
    fn test_heritage_or_and_price() {
        let filters = ProductFilters::from_query("heritage=palestinian&heritage=egyptian&min=10");
        assert_eq!(
            build_search_query(&filters).as_deref(),
            Some(r#"(tag:"heritage:palestinian" OR tag:"heritage:egyptian") AND price:>=10"#)
        );
    }

    #[test]
    fn test_all_dimensions_in_order() {
        let filters = ProductFilters::from_query(
            "q=olive%20wood&category=ceramics,GLASS&heritage=Syrian&max=99.50&min=5",
        );
        assert_eq!(
            build_search_query(&filters).as_deref(),
            Some(concat!(
                r#"title:"olive wood" AND (tag:"heritage:syrian") AND "#,
                r#"(product_type:"Ceramics" OR product_type:"Glass") AND price:>=5 AND price:<=99.5"#
            ))
        );
    }

    #[test]
    fn test_unrecognized_values_are_omitted() {
        let filters = ProductFilters::from_query(
            "heritage=atlantean,,palestinian&category=Spaceships&min=-4&max=cheap&q=%20%20",
        );
        assert_eq!(filters.heritage, ["palestinian"]);
        assert!(filters.category.is_empty());
        assert_eq!(filters.min_price, None);
        assert_eq!(filters.max_price, None);
        assert_eq!(filters.term, None);
        assert_eq!(
            build_search_query(&filters).as_deref(),
            Some(r#"(tag:"heritage:palestinian")"#)
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let filters = ProductFilters::from_query("heritage=syrian,SYRIAN&heritage=syrian");
        assert_eq!(filters.heritage, ["syrian"]);
    }

    #[test]
    fn test_term_is_quoted() {
        let filters = ProductFilters::from_query("q=%22handmade%22%20rug");
        assert_eq!(
            build_search_query(&filters).as_deref(),
            Some(r#"title:"\"handmade\" rug""#)
        );
    }

    #[test]
    fn test_sort_parsing() {
        for (raw, expected) in [
            ("price-asc", (ProductSortKey::Price, false)),
            ("price-desc", (ProductSortKey::Price, true)),
            ("title-asc", (ProductSortKey::Title, false)),
            ("title-desc", (ProductSortKey::Title, true)),
            ("created-asc", (ProductSortKey::CreatedAt, false)),
            ("created-desc", (ProductSortKey::CreatedAt, true)),
            ("newest", (ProductSortKey::CreatedAt, true)),
            ("bogus", (ProductSortKey::CreatedAt, true)),
        ] {
            let filters = ProductFilters::from_query(&format!("sort={raw}"));
            assert_eq!(filters.sort.sort_key(), expected, "sort={raw}");
        }
    }

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(ProductFilters::from_query("first=500").first, MAX_PAGE_SIZE);
        assert_eq!(ProductFilters::from_query("first=0").first, 1);
        assert_eq!(ProductFilters::from_query("first=abc").first, DEFAULT_PAGE_SIZE);
        assert_eq!(ProductFilters::from_query("first=12").first, 12);
    }
}
