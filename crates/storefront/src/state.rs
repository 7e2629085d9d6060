//! Application state shared across front ends.

use std::sync::Arc;

use azlan_core::PaymentMethod;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::cart::Cart;
use crate::catalog::{CatalogEngine, Product};
use crate::checkout::{self, CheckoutForm, OrderConfirmation, OrderRequest, OrderTotals};
use crate::config::StorefrontConfig;
use crate::coupon::{self, AppliedCoupon};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::feed::FeedClient;
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::search::SearchState;
use crate::session::{Session, SessionUser};
use crate::storage::{FileStore, SharedStore};
use crate::woo::WooClient;

/// Application state shared by every command and view.
///
/// This struct is cheaply cloneable via `Arc`. The cart, catalog and search
/// context sit behind async mutexes so a lock can be held across a request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    woo: WooClient,
    feed: FeedClient,
    store: SharedStore,
    cart: Mutex<Cart>,
    catalog: Mutex<CatalogEngine>,
    search: Mutex<SearchState>,
    session: Session,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the state with a file-backed store under `config.data_dir`
    /// and notices sent to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, AppError> {
        let store: SharedStore = Arc::new(FileStore::new(config.data_dir.clone()));
        Self::new(config, store, Arc::new(LogNotifier))
    }

    /// Create the state over an explicit store and notifier.
    ///
    /// The cart is hydrated from `store` immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        store: SharedStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let woo = WooClient::new(&config.woo)?;
        let feed = FeedClient::new(config.feed_url.clone(), &config.woo.user_agent)?;
        let cart = Cart::load(Arc::clone(&store));
        let session = Session::new(Arc::clone(&store));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                woo,
                feed,
                store,
                cart: Mutex::new(cart),
                catalog: Mutex::new(CatalogEngine::new()),
                search: Mutex::new(SearchState::new()),
                session,
                notifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn woo(&self) -> &WooClient {
        &self.inner.woo
    }

    #[must_use]
    pub fn feed(&self) -> &FeedClient {
        &self.inner.feed
    }

    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Run `f` with exclusive access to the cart. Every cart mutation goes
    /// through here; the cart persists itself after each change.
    pub async fn with_cart<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.inner.cart.lock().await;
        f(&mut cart)
    }

    /// Add `quantity` of `product` to the cart and tell the user.
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.with_cart(|cart| cart.add(product, quantity)).await;
        self.notifier()
            .notify(Notice::success(format!("{} added to cart!", product.name)));
    }

    /// Subtotal, shipping, display tax and discount for the current cart.
    pub async fn totals(&self, coupon: Option<&AppliedCoupon>) -> OrderTotals {
        let shipping = self.inner.config.shipping_fee;
        self.with_cart(|cart| OrderTotals::for_cart(cart, shipping, coupon))
            .await
    }

    // =========================================================================
    // Catalog & search
    // =========================================================================

    /// Run `f` with exclusive access to the catalog engine.
    pub async fn with_catalog<R>(&self, f: impl FnOnce(&mut CatalogEngine) -> R) -> R {
        let mut catalog = self.inner.catalog.lock().await;
        f(&mut catalog)
    }

    /// Run `f` with exclusive access to the search context.
    pub async fn with_search<R>(&self, f: impl FnOnce(&mut SearchState) -> R) -> R {
        let mut search = self.inner.search.lock().await;
        f(&mut search)
    }

    /// Reload the catalog from WooCommerce.
    ///
    /// The engine lock is released during the fetch; if another load starts
    /// meanwhile, this one's result is dropped and `false` is returned.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> bool {
        let ticket = self.with_catalog(CatalogEngine::begin_load).await;
        let outcome = self.inner.woo.products().await;
        let notifier = Arc::clone(&self.inner.notifier);
        self.with_catalog(|catalog| catalog.finish_load(ticket, outcome, notifier.as_ref()))
            .await
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and attach the customer to error reports.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` on bad credentials or storage failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AppError> {
        let user = self
            .inner
            .session
            .login(&self.inner.woo, email, password)
            .await?;
        set_sentry_user(
            &user.id.map_or_else(|| user.email.clone(), |id| id.to_string()),
            Some(&user.email),
        );
        self.notifier().notify(Notice::success(format!(
            "Welcome back, {}!",
            user.display_name
        )));
        Ok(user)
    }

    /// Log out and detach the customer from error reports.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the stored session cannot be removed.
    pub fn logout(&self) -> Result<(), AppError> {
        self.inner.session.logout()?;
        clear_sentry_user();
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Validate `code` against the current cart total.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Coupon` for unknown, expired or below-minimum
    /// coupons.
    pub async fn apply_coupon(&self, code: &str) -> Result<AppliedCoupon, AppError> {
        let total = self.with_cart(|cart| cart.total()).await;
        match coupon::validate_coupon(&self.inner.woo, code, total, Utc::now()).await {
            Ok(applied) => {
                self.notifier().notify(Notice::success("Coupon applied!"));
                Ok(applied)
            }
            Err(e) => {
                self.notifier().notify(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Place an order for the current cart.
    ///
    /// The logged-in customer (if any) and the configured shipping fee are
    /// filled in here. The cart stays locked until the store answers, so it
    /// cannot change between validation and clearing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` on validation, stock or order failure;
    /// the cart is left intact in those cases.
    #[instrument(skip_all, fields(payment = %payment))]
    pub async fn place_order(
        &self,
        form: CheckoutForm,
        payment: PaymentMethod,
        coupon: Option<AppliedCoupon>,
        check_stock: bool,
    ) -> Result<OrderConfirmation, AppError> {
        let mut request = OrderRequest::new(form, payment);
        request.customer_id = self.inner.session.customer_id();
        request.coupon = coupon;
        request.shipping_fee = self.inner.config.shipping_fee;
        request.check_stock = check_stock;

        let mut cart = self.inner.cart.lock().await;
        let confirmation = checkout::place_order(
            &self.inner.woo,
            &mut cart,
            &request,
            self.inner.notifier.as_ref(),
        )
        .await?;
        Ok(confirmation)
    }
}
