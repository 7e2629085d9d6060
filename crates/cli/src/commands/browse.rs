//! Catalog browsing: the product listing and the feed-backed collections.

use std::time::Instant;

use azlan_core::ProductId;
use azlan_storefront::AppState;
use azlan_storefront::AppError;
use azlan_storefront::catalog::{AlphaSort, FilterState, PriceSort, StockFilter};
use azlan_storefront::feed::{self, FEATURED_LIMIT, HOME_NEW_ARRIVALS_LIMIT};
use clap::Args;
use rust_decimal::Decimal;

use crate::output;

/// Listing controls. Flags override whatever `--query` sets.
#[derive(Debug, Default, Args)]
pub struct ProductFilterArgs {
    /// Listing URL query string, e.g. `category=Men&sort=low-high`
    #[arg(long)]
    pub query: Option<String>,

    /// Case-insensitive product name search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Category name, or `all`
    #[arg(short, long)]
    pub category: Option<String>,

    /// `all`, `instock` or `onsale`
    #[arg(long)]
    pub stock: Option<StockFilter>,

    /// Lowest effective price
    #[arg(long)]
    pub min: Option<Decimal>,

    /// Highest effective price
    #[arg(long)]
    pub max: Option<Decimal>,

    /// `low-high` or `high-low`
    #[arg(long)]
    pub sort_price: Option<PriceSort>,

    /// `a-z` or `z-a`
    #[arg(long)]
    pub sort_name: Option<AlphaSort>,

    /// Page number
    #[arg(short, long)]
    pub page: Option<usize>,
}

impl ProductFilterArgs {
    /// The filter state these arguments describe, leaving the page and
    /// search term to the caller.
    fn filters(&self) -> FilterState {
        let mut filters = self
            .query
            .as_deref()
            .map(FilterState::from_query)
            .unwrap_or_default();
        if let Some(category) = &self.category {
            filters.category.clone_from(category);
        }
        if let Some(stock) = self.stock {
            filters.stock = stock;
        }
        if self.min.is_some() {
            filters.price_range.min = self.min;
        }
        if self.max.is_some() {
            filters.price_range.max = self.max;
        }
        if let Some(sort) = self.sort_price {
            filters.price_sort = sort;
        }
        if let Some(sort) = self.sort_name {
            filters.alpha_sort = sort;
        }
        filters
    }
}

pub async fn products(state: &AppState, args: &ProductFilterArgs) {
    state.load_catalog().await;

    let search = match &args.search {
        Some(term) => Some(
            state
                .with_search(|search| {
                    search.set_term(term.as_str(), Instant::now());
                    search.submit()
                })
                .await,
        ),
        None => None,
    };

    let page = state
        .with_catalog(|catalog| {
            *catalog.filters_mut() = args.filters();
            if let Some(term) = search {
                catalog.set_search(term);
            }
            if let Some(page) = args.page {
                catalog.go_to_page(page, &mut ());
            }
            tracing::debug!(active = catalog.active_filter_count(), "listing filters");
            catalog.page()
        })
        .await;

    output::product_page(&page);
}

pub async fn product(state: &AppState, id: u64) -> Result<(), AppError> {
    let product = state.woo().product(ProductId::new(id)).await?;
    output::product_detail(&product);
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<(), AppError> {
    let categories = state.woo().categories().await?;
    output::categories(&categories);
    Ok(())
}

pub async fn featured(state: &AppState) {
    let products = state.feed().browse(state.notifier()).await;
    output::feed_products(&feed::featured(&products, FEATURED_LIMIT));
}

pub async fn new_arrivals(state: &AppState) {
    let products = state.feed().browse(state.notifier()).await;
    output::feed_products(&feed::new_arrivals(&products, HOME_NEW_ARRIVALS_LIMIT));
}

pub async fn trending(state: &AppState, page: usize) {
    let products = state.feed().browse(state.notifier()).await;
    output::product_page(&feed::trending_page(&products, page));
}
