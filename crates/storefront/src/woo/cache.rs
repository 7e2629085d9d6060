//! Cache types for WooCommerce responses.

use std::sync::Arc;

use azlan_core::ProductId;

use super::types::Category;
use crate::catalog::Product;

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// The full auto-paginated product list.
    Products,
    Product(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
}
