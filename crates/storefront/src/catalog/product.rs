//! Normalized product shape shared by the catalog, cart and checkout.

use azlan_core::{ProductId, StockStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A category reference attached to a product.
///
/// Names are not guaranteed unique and are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
}

/// A product image; the first one on a product is its primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A catalog product after normalization.
///
/// Treated as read-only input: the cart stores a snapshot copied at add time
/// and never re-fetches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Base price.
    pub price: Decimal,
    /// Discounted price, when the product has one.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl Product {
    /// Build a minimal in-stock product with no categories or images.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            categories: Vec::new(),
            images: Vec::new(),
            handle: None,
        }
    }

    /// The price a customer pays: the sale price when set and positive,
    /// otherwise the base price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO => sale,
            _ => self.price,
        }
    }

    /// True when a positive sale price undercuts the base price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.sale_price
            .is_some_and(|sale| sale > Decimal::ZERO && sale < self.price)
    }

    /// Case-insensitive category membership.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        let wanted = category.to_lowercase();
        self.categories
            .iter()
            .any(|c| !c.name.is_empty() && c.name.to_lowercase() == wanted)
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }
}
