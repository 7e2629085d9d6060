//! Secondary, read-only product feed (a Shopify-style `products.json`).
//!
//! The home page rails and the trending page are curated from this feed by
//! tag rather than from WooCommerce. Feed records are converted into the
//! same [`Product`] shape the rest of the crate uses.

use azlan_core::{ProductId, StockStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::catalog::normalize::coerce_decimal;
use crate::catalog::{PAGE_SIZE, Page, Product, ProductImage};
use crate::notify::{Notice, Notifier};

/// Size of the featured rail on the home page.
pub const FEATURED_LIMIT: usize = 8;

/// Size of the new-arrivals rail on the home page.
pub const HOME_NEW_ARRIVALS_LIMIT: usize = 4;

const FEATURED_TAG: &str = "Featured";
const NEW_ARRIVALS_TAG: &str = "New Arrivals";
const POPULAR_TAGS: [&str; 4] = ["best seller", "bestseller", "most popular", "popular"];

/// Errors that can occur when fetching the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Feed records
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    products: Vec<FeedProduct>,
}

/// A product as it appears in the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedProduct {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Either a JSON array or a comma-separated string upstream.
    #[serde(default, deserialize_with = "tag_list")]
    pub tags: Vec<String>,
    /// Unparseable timestamps are treated as missing.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub variants: Vec<FeedVariant>,
    #[serde(default)]
    pub images: Vec<FeedImage>,
    #[serde(default)]
    pub handle: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedVariant {
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub compare_at_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedImage {
    pub src: String,
}

impl FeedProduct {
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn is_popular(&self) -> bool {
        self.tags
            .iter()
            .any(|t| POPULAR_TAGS.contains(&t.to_lowercase().as_str()))
    }

    /// Convert to a catalog [`Product`].
    ///
    /// When the first variant's compare-at price is higher than its price,
    /// the compare-at price becomes the base price and the variant price the
    /// sale price.
    #[must_use]
    pub fn to_product(&self) -> Product {
        let variant = self.variants.first().cloned().unwrap_or_default();
        let price = variant.price.unwrap_or(Decimal::ZERO);
        let (price, sale_price) = match variant.compare_at_price {
            Some(compare_at) if compare_at > price => (compare_at, Some(price)),
            _ => (price, None),
        };

        Product {
            id: ProductId::new(self.id),
            name: self.title.clone(),
            price,
            sale_price,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            categories: Vec::new(),
            images: self
                .images
                .iter()
                .filter(|i| !i.src.is_empty())
                .map(|i| ProductImage {
                    src: i.src.clone(),
                    alt: Some(self.title.clone()),
                })
                .collect(),
            handle: Some(self.handle.clone()).filter(|h| !h.is_empty()),
        }
    }
}

fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|t| match t {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|t| !t.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_decimal(&Value::deserialize(deserializer)?))
}

// =============================================================================
// Selections
// =============================================================================

fn newest_first(mut products: Vec<FeedProduct>) -> Vec<FeedProduct> {
    // Stable, and `None` sorts after every timestamp
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    products
}

/// Products tagged `Featured` (or every product when none are), newest
/// first, at most `limit`.
#[must_use]
pub fn featured(products: &[FeedProduct], limit: usize) -> Vec<FeedProduct> {
    let tagged: Vec<FeedProduct> = products
        .iter()
        .filter(|p| p.has_tag(FEATURED_TAG))
        .cloned()
        .collect();
    let pool = if tagged.is_empty() {
        products.to_vec()
    } else {
        tagged
    };
    let mut list = newest_first(pool);
    list.truncate(limit);
    list
}

/// Products tagged `New Arrivals`, newest first, at most `limit`.
#[must_use]
pub fn new_arrivals(products: &[FeedProduct], limit: usize) -> Vec<FeedProduct> {
    let mut list = newest_first(
        products
            .iter()
            .filter(|p| p.has_tag(NEW_ARRIVALS_TAG))
            .cloned()
            .collect(),
    );
    list.truncate(limit);
    list
}

/// Products carrying any best-seller style tag, newest first.
#[must_use]
pub fn most_popular(products: &[FeedProduct]) -> Vec<FeedProduct> {
    newest_first(products.iter().filter(|p| p.is_popular()).cloned().collect())
}

/// New arrivals followed by popular products, deduplicated by id keeping the
/// first occurrence.
#[must_use]
pub fn trending(products: &[FeedProduct]) -> Vec<FeedProduct> {
    let mut seen = std::collections::HashSet::new();
    new_arrivals(products, usize::MAX)
        .into_iter()
        .chain(most_popular(products))
        .filter(|p| seen.insert(p.id))
        .collect()
}

/// One 12-item page of the trending list, as catalog products.
#[must_use]
pub fn trending_page(products: &[FeedProduct], page: usize) -> Page<Product> {
    let converted: Vec<Product> = trending(products).iter().map(FeedProduct::to_product).collect();
    Page::slice(&converted, page, PAGE_SIZE)
}

// =============================================================================
// FeedClient
// =============================================================================

/// Fetches the product feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a feed client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: impl Into<String>, user_agent: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch and parse the whole feed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// body that is not a feed document.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn products(&self) -> Result<Vec<FeedProduct>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let text = response.text().await?;
        let document: FeedDocument = serde_json::from_str(&text)?;
        tracing::debug!(count = document.products.len(), "fetched product feed");
        Ok(document.products)
    }

    /// Fetch the feed for display: failures yield an empty list and a notice.
    pub async fn browse(&self, notifier: &dyn Notifier) -> Vec<FeedProduct> {
        match self.products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "product feed unavailable");
                notifier.notify(Notice::error("Failed to load products"));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn feed(value: Value) -> Vec<FeedProduct> {
        serde_json::from_value::<FeedDocument>(value).unwrap().products
    }

    fn sample() -> Vec<FeedProduct> {
        feed(json!({"products": [
            {"id": 1, "title": "Old Featured", "tags": ["Featured"], "created_at": "2024-01-01T10:00:00+05:00",
             "variants": [{"price": "1500.00", "compare_at_price": "2000.00"}], "images": [{"src": "https://cdn/1.jpg"}], "handle": "old-featured"},
            {"id": 2, "title": "New Featured", "tags": "Featured, New Arrivals", "created_at": "2024-06-01T10:00:00+05:00",
             "variants": [{"price": "900.00", "compare_at_price": null}], "images": [], "handle": "new-featured"},
            {"id": 3, "title": "Seller", "tags": ["Best Seller", "New Arrivals"], "created_at": "2024-03-01T10:00:00+05:00",
             "variants": [{"price": "700.00", "compare_at_price": "500.00"}]},
            {"id": 4, "title": "Plain", "tags": [], "created_at": "not a date"},
            {"id": 5, "title": "Popular", "tags": ["popular"], "created_at": "2024-05-01T10:00:00+05:00"}
        ]}))
    }

    fn ids(products: &[FeedProduct]) -> Vec<u64> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_conversion_uses_compare_at_as_base_price() {
        let products = sample();
        let sale = products[0].to_product();
        assert_eq!(sale.price, Decimal::new(2000, 0));
        assert_eq!(sale.sale_price, Some(Decimal::new(1500, 0)));
        assert!(sale.is_on_sale());
        assert_eq!(sale.images[0].alt.as_deref(), Some("Old Featured"));
        assert_eq!(sale.handle.as_deref(), Some("old-featured"));

        let lower_compare = products[2].to_product();
        assert_eq!(lower_compare.price, Decimal::new(700, 0));
        assert_eq!(lower_compare.sale_price, None);

        let no_variant = products[3].to_product();
        assert_eq!(no_variant.price, Decimal::ZERO);
        assert!(no_variant.stock_status.is_in_stock());
    }

    #[test]
    fn test_tags_accept_comma_separated_string() {
        let products = sample();
        assert_eq!(products[1].tags, vec!["Featured", "New Arrivals"]);
        assert_eq!(products[3].created_at, None);
    }

    #[test]
    fn test_featured_newest_first() {
        assert_eq!(ids(&featured(&sample(), FEATURED_LIMIT)), vec![2, 1]);
        assert_eq!(ids(&featured(&sample(), 1)), vec![2]);
    }

    #[test]
    fn test_featured_falls_back_to_everything() {
        let products = feed(json!({"products": [
            {"id": 1, "created_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "created_at": "2024-02-01T00:00:00Z"}
        ]}));
        assert_eq!(ids(&featured(&products, FEATURED_LIMIT)), vec![2, 1]);
    }

    #[test]
    fn test_popular_tags_are_case_insensitive() {
        assert_eq!(ids(&most_popular(&sample())), vec![5, 3]);
    }

    #[test]
    fn test_trending_merges_without_duplicates() {
        assert_eq!(ids(&new_arrivals(&sample(), 10)), vec![2, 3]);
        assert_eq!(ids(&trending(&sample())), vec![2, 3, 5]);

        let page = trending_page(&sample(), 1);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.items[0].name, "New Featured");
    }

    #[test]
    fn test_missing_products_key_is_empty() {
        assert!(feed(json!({})).is_empty());
    }
}
