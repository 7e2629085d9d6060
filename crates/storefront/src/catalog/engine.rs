//! The product listing engine: full collection, filter state, derived views.
//!
//! The engine keeps the complete product list fetched once and recomputes
//! the filtered result and the visible page from scratch whenever it is
//! asked. Catalogs are tens to low hundreds of items, so no incremental
//! maintenance is attempted.
//!
//! Loading is split into [`CatalogEngine::begin_load`] and
//! [`CatalogEngine::finish_load`] so a caller can release its lock while the
//! fetch is in flight. Every `begin_load` bumps a generation counter; a
//! result arriving with an older ticket is discarded, so a slow response can
//! never overwrite a newer one or land after the view was torn down.

use rust_decimal::Decimal;
use tracing::instrument;

use super::page::{PAGE_SIZE, Page, Viewport};
use super::product::Product;
use super::query::{FilterState, apply_filters};
use crate::notify::{Notice, Notifier};
use crate::woo::{WooClient, WooError};

/// Categories offered even before any product mentions them.
pub const BASELINE_CATEGORIES: [&str; 5] = ["Kids", "Boys", "Girls", "Men", "Women"];

/// Message shown when the catalog cannot be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load products from WooCommerce";

/// Proof that a load was started; hand it back to [`CatalogEngine::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a load ticket must be passed to finish_load"]
pub struct LoadTicket {
    generation: u64,
}

/// Lowest and highest effective price in the full collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceStats {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Default)]
pub struct CatalogEngine {
    products: Vec<Product>,
    filters: FilterState,
    generation: u64,
    in_flight: Option<u64>,
}

impl CatalogEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine already holding `products`, for callers that fetched them
    /// some other way (tests, the product feed).
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    /// Start with filters parsed from a listing URL query string.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.filters = FilterState::from_query(query);
        self
    }

    /// The full, unfiltered collection.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Mutable access to the controls. Changing a filter leaves the page
    /// number alone; the next [`Self::page`] clamps it.
    pub const fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    /// Apply a settled search term.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filters.search = term.into();
    }

    /// Reset every control to its default, including page 1.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count()
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// Filtered and sorted result, before pagination.
    #[must_use]
    pub fn results(&self) -> Vec<Product> {
        apply_filters(&self.products, &self.filters)
    }

    /// The visible page of the current result.
    #[must_use]
    pub fn page(&self) -> Page<Product> {
        Page::slice(&self.results(), self.filters.page, PAGE_SIZE)
    }

    /// Move to `page` and ask the viewport to scroll back to the top.
    pub fn go_to_page(&mut self, page: usize, viewport: &mut dyn Viewport) {
        self.filters.page = page.max(1);
        viewport.scroll_to_top();
    }

    /// Baseline categories followed by every category seen in the collection,
    /// deduplicated by exact name in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = BASELINE_CATEGORIES.iter().map(ToString::to_string).collect();
        for category in self.products.iter().flat_map(|p| &p.categories) {
            if !category.name.is_empty() && !names.contains(&category.name) {
                names.push(category.name.clone());
            }
        }
        names
    }

    /// Price bounds over the full collection; zeroes when it is empty.
    #[must_use]
    pub fn price_stats(&self) -> PriceStats {
        let mut prices = self.products.iter().map(Product::effective_price);
        let Some(first) = prices.next() else {
            return PriceStats::default();
        };
        prices.fold(
            PriceStats {
                min: first,
                max: first,
            },
            |stats, price| PriceStats {
                min: stats.min.min(price),
                max: stats.max.max(price),
            },
        )
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Mark a load as started. Any earlier ticket becomes stale.
    pub const fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Whether a started load has not finished yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Invalidate any in-flight load, e.g. when the listing is closed.
    pub const fn detach(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    /// Apply the outcome of a load started with `ticket`.
    ///
    /// Returns `false` when the ticket is stale and the outcome was dropped.
    /// A failure empties the collection and tells the user; it is not retried.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<Vec<Product>, WooError>,
        notifier: &dyn Notifier,
    ) -> bool {
        if self.in_flight != Some(ticket.generation) {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale catalog load"
            );
            return false;
        }
        self.in_flight = None;

        match outcome {
            Ok(products) => {
                tracing::info!(count = products.len(), "catalog loaded");
                self.products = products;
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog load failed");
                self.products.clear();
                notifier.notify(Notice::error(LOAD_FAILED_MESSAGE));
            }
        }
        true
    }

    /// Fetch the full catalog from WooCommerce and apply it.
    ///
    /// This holds `&mut self` across the fetch; callers sharing the engine
    /// behind a lock should use `begin_load`/`finish_load` directly.
    #[instrument(skip_all)]
    pub async fn load(&mut self, client: &WooClient, notifier: &dyn Notifier) -> bool {
        let ticket = self.begin_load();
        let outcome = client.products().await;
        self.finish_load(ticket, outcome, notifier)
    }
}
