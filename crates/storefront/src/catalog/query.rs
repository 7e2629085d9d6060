//! Filter, sort and query-string handling for the product listing.
//!
//! The pipeline runs text → category → stock/sale → price range → sort. All
//! filters are conjunctive; the order only keeps later stages working on an
//! already reduced set.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::product::Product;

/// Category selector value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Stock/sale filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockFilter {
    #[default]
    All,
    InStock,
    OnSale,
}

impl FromStr for StockFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "instock" | "in-stock" => Ok(Self::InStock),
            "onsale" | "on-sale" => Ok(Self::OnSale),
            _ => Err(format!("invalid stock filter: {s}")),
        }
    }
}

impl fmt::Display for StockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::InStock => "instock",
            Self::OnSale => "onsale",
        })
    }
}

/// Sort by effective price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSort {
    #[default]
    None,
    LowHigh,
    HighLow,
}

impl FromStr for PriceSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "low-high" => Ok(Self::LowHigh),
            "high-low" => Ok(Self::HighLow),
            _ => Err(format!("invalid price sort: {s}")),
        }
    }
}

/// Sort by product name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaSort {
    #[default]
    None,
    AToZ,
    ZToA,
}

impl FromStr for AlphaSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "a-z" => Ok(Self::AToZ),
            "z-a" => Ok(Self::ZToA),
            _ => Err(format!("invalid name sort: {s}")),
        }
    }
}

/// Inclusive bounds on effective price. An unset bound imposes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

/// Every control that shapes the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Settled (debounced) search term.
    pub search: String,
    pub category: String,
    pub stock: StockFilter,
    pub price_range: PriceRange,
    pub price_sort: PriceSort,
    pub alpha_sort: AlphaSort,
    /// 1-based page number.
    pub page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
            stock: StockFilter::All,
            price_range: PriceRange::default(),
            price_sort: PriceSort::None,
            alpha_sort: AlphaSort::None,
            page: 1,
        }
    }
}

impl FilterState {
    /// Build the initial state from a listing URL query string such as
    /// `category=Men&sort=low-high`.
    ///
    /// `category` is the parameter links from category tiles use; `q`,
    /// `stock`, `sort`, `name`, `min`, `max` and `page` are also honored.
    /// Unknown parameters and unparseable values are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "category" if !value.is_empty() => state.category = value.to_string(),
                "q" | "search" => state.search = value.to_string(),
                "stock" => state.stock = value.parse().unwrap_or_default(),
                "sort" => state.price_sort = value.parse().unwrap_or_default(),
                "name" => state.alpha_sort = value.parse().unwrap_or_default(),
                "min" => state.price_range.min = value.parse().ok(),
                "max" => state.price_range.max = value.parse().ok(),
                "page" => state.page = value.parse().unwrap_or(1).max(1),
                _ => {}
            }
        }
        state
    }

    /// Reset every control, including the search term and page.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn category_selected(&self) -> bool {
        !self.category.eq_ignore_ascii_case(ALL_CATEGORIES)
    }

    /// Number of controls currently narrowing or reordering the listing.
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            !self.search.is_empty(),
            self.price_sort != PriceSort::None,
            self.alpha_sort != AlphaSort::None,
            self.category_selected(),
            self.stock != StockFilter::All,
            self.price_range.is_set(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Whether `product` passes every filter (ignoring sorting and paging).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product)
            && self.matches_category(product)
            && self.matches_stock(product)
            && self.price_range.contains(product.effective_price())
    }

    fn matches_search(&self, product: &Product) -> bool {
        self.search.is_empty()
            || product
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    fn matches_category(&self, product: &Product) -> bool {
        !self.category_selected() || product.in_category(&self.category)
    }

    fn matches_stock(&self, product: &Product) -> bool {
        match self.stock {
            StockFilter::All => true,
            StockFilter::InStock => product.stock_status.is_in_stock(),
            StockFilter::OnSale => product.is_on_sale(),
        }
    }

    /// Ordering used by the sort stage, or `None` when no sort is active.
    ///
    /// Price sort is the primary key; name sort breaks ties between equal
    /// effective prices. Either may be used alone.
    fn comparator(&self) -> Option<impl Fn(&Product, &Product) -> Ordering> {
        if self.price_sort == PriceSort::None && self.alpha_sort == AlphaSort::None {
            return None;
        }
        let price_sort = self.price_sort;
        let alpha_sort = self.alpha_sort;
        Some(move |a: &Product, b: &Product| {
            let by_price = match price_sort {
                PriceSort::None => Ordering::Equal,
                PriceSort::LowHigh => a.effective_price().cmp(&b.effective_price()),
                PriceSort::HighLow => b.effective_price().cmp(&a.effective_price()),
            };
            by_price.then_with(|| match alpha_sort {
                AlphaSort::None => Ordering::Equal,
                AlphaSort::AToZ => compare_names(&a.name, &b.name),
                AlphaSort::ZToA => compare_names(&b.name, &a.name),
            })
        })
    }
}

/// Case-insensitive name order with a byte-order tiebreak so the order is total.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Run the full filter and sort pipeline over `products`.
///
/// Sorting is stable, so products that compare equal keep their input order.
#[must_use]
pub fn apply_filters(products: &[Product], state: &FilterState) -> Vec<Product> {
    let mut result: Vec<Product> = products
        .iter()
        .filter(|p| state.matches(p))
        .cloned()
        .collect();

    if let Some(cmp) = state.comparator() {
        result.sort_by(cmp);
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use azlan_core::{ProductId, StockStatus};

    use super::*;
    use crate::catalog::product::CategoryRef;

    fn product(id: u64, name: &str, price: i64, sale: Option<i64>, category: &str) -> Product {
        Product {
            sale_price: sale.map(|s| Decimal::new(s, 0)),
            categories: vec![CategoryRef {
                name: category.to_string(),
            }],
            ..Product::new(ProductId::new(id), name, Decimal::new(price, 0))
        }
    }

    fn shirt_and_jeans() -> Vec<Product> {
        let mut jeans = product(2, "Blue Jeans", 2000, None, "Men");
        jeans.stock_status = StockStatus::OutOfStock;
        vec![product(1, "Red Shirt", 1000, Some(800), "Men"), jeans]
    }

    fn ids(products: &[Product]) -> Vec<u64> {
        products.iter().map(|p| p.id.as_u64()).collect()
    }

    #[test]
    fn test_in_stock_filter() {
        let state = FilterState {
            stock: StockFilter::InStock,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&shirt_and_jeans(), &state)), vec![1]);
    }

    #[test]
    fn test_price_sort_uses_effective_price() {
        let mut products = shirt_and_jeans();
        products.reverse();
        let state = FilterState {
            price_sort: PriceSort::LowHigh,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![1, 2]);

        let state = FilterState {
            price_sort: PriceSort::HighLow,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![2, 1]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let state = FilterState {
            search: "shirt".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&shirt_and_jeans(), &state)), vec![1]);

        let state = FilterState {
            search: "JEAN".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&shirt_and_jeans(), &state)), vec![2]);
    }

    #[test]
    fn test_category_all_is_unfiltered() {
        let products = vec![
            product(1, "A", 10, None, "Men"),
            product(2, "B", 10, None, "Women"),
            product(3, "C", 10, None, "Kids"),
        ];
        let all = apply_filters(&products, &FilterState::default());
        assert_eq!(ids(&all), vec![1, 2, 3]);

        let state = FilterState {
            category: "women".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![2]);

        let state = FilterState {
            category: "ALL".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![1, 2, 3]);
    }

    #[test]
    fn test_on_sale_filter() {
        let products = vec![
            product(1, "Sale", 1000, Some(800), "Men"),
            product(2, "Full", 1000, None, "Men"),
            product(3, "Zero sale", 1000, Some(0), "Men"),
            product(4, "Inverted", 1000, Some(1200), "Men"),
        ];
        let state = FilterState {
            stock: StockFilter::OnSale,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![1]);
    }

    #[test]
    fn test_price_range_bounds_are_inclusive() {
        let products = vec![
            product(1, "A", 500, None, "Men"),
            product(2, "B", 1000, Some(800), "Men"),
            product(3, "C", 1500, None, "Men"),
        ];
        let state = FilterState {
            price_range: PriceRange {
                min: Some(Decimal::new(500, 0)),
                max: Some(Decimal::new(800, 0)),
            },
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![1, 2]);

        let state = FilterState {
            price_range: PriceRange {
                min: Some(Decimal::new(900, 0)),
                max: None,
            },
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![3]);
    }

    #[test]
    fn test_name_sort_breaks_price_ties() {
        let products = vec![
            product(1, "beta", 100, None, "Men"),
            product(2, "Alpha", 100, None, "Men"),
            product(3, "gamma", 50, None, "Men"),
        ];
        let state = FilterState {
            price_sort: PriceSort::LowHigh,
            alpha_sort: AlphaSort::AToZ,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![3, 2, 1]);

        let state = FilterState {
            alpha_sort: AlphaSort::ZToA,
            ..FilterState::default()
        };
        assert_eq!(ids(&apply_filters(&products, &state)), vec![3, 1, 2]);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let products = vec![
            product(1, "Red Shirt", 1000, Some(800), "Men"),
            product(2, "Red Scarf", 700, None, "Women"),
            product(3, "Red Cap", 300, None, "Men"),
            product(4, "Blue Shirt", 900, Some(850), "Men"),
        ];
        let state = FilterState {
            search: "red".to_string(),
            category: "men".to_string(),
            price_sort: PriceSort::HighLow,
            ..FilterState::default()
        };
        let once = apply_filters(&products, &state);
        let twice = apply_filters(&once, &state);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec![1, 3]);
    }

    #[test]
    fn test_unsorted_keeps_input_order() {
        let products = vec![
            product(3, "C", 30, None, "Men"),
            product(1, "A", 10, None, "Men"),
            product(2, "B", 20, None, "Men"),
        ];
        assert_eq!(
            ids(&apply_filters(&products, &FilterState::default())),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_active_count() {
        assert_eq!(FilterState::default().active_count(), 0);
        let state = FilterState {
            search: "x".to_string(),
            category: "Men".to_string(),
            stock: StockFilter::OnSale,
            price_range: PriceRange {
                min: None,
                max: Some(Decimal::ONE),
            },
            price_sort: PriceSort::LowHigh,
            alpha_sort: AlphaSort::ZToA,
            page: 3,
        };
        assert_eq!(state.active_count(), 6);
    }

    #[test]
    fn test_from_query() {
        let state = FilterState::from_query("?category=Women&sort=high-low&min=100&page=2&foo=bar");
        assert_eq!(state.category, "Women");
        assert_eq!(state.price_sort, PriceSort::HighLow);
        assert_eq!(state.price_range.min, Some(Decimal::new(100, 0)));
        assert_eq!(state.page, 2);

        let state = FilterState::from_query("category=&page=0&stock=bogus");
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = FilterState::from_query("category=Men&q=shirt&page=4");
        state.clear();
        assert_eq!(state, FilterState::default());
        assert_eq!(state.page, 1);
    }
}
