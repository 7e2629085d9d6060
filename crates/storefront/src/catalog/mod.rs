//! Product catalog: normalization, filtering, sorting and pagination.
//!
//! # Modules
//!
//! - [`product`] - The normalized [`Product`] shape
//! - [`normalize`] - Coercion of raw backend records
//! - [`query`] - Filter/sort state and the listing pipeline
//! - [`page`] - Fixed-size pagination
//! - [`debounce`] - Idle-interval coalescing for search input
//! - [`engine`] - [`CatalogEngine`], which ties the above together

pub mod debounce;
pub mod engine;
pub mod normalize;
pub mod page;
pub mod product;
pub mod query;

pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use engine::{BASELINE_CATEGORIES, CatalogEngine, LoadTicket, PriceStats};
pub use normalize::{normalize_product, normalize_products};
pub use page::{PAGE_SIZE, Page, Viewport};
pub use product::{CategoryRef, Product, ProductImage};
pub use query::{
    ALL_CATEGORIES, AlphaSort, FilterState, PriceRange, PriceSort, StockFilter, apply_filters,
    compare_names,
};
