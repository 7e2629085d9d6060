//! Test harness for the Azlan storefront.
//!
//! [`FakeWoo`] serves the slice of the WooCommerce REST API and the JWT auth
//! plugin that the storefront uses, from an in-process axum server on an
//! ephemeral port. Tests seed it with products, coupons and customers, run
//! storefront operations against it, and inspect what it recorded.
//!
//! ```rust,ignore
//! let woo = FakeWoo::start(Backend::default().with_products(products)).await;
//! let (state, _store, _notices) = woo.app_state();
//! state.load_catalog().await;
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use azlan_storefront::notify::RecordingNotifier;
use azlan_storefront::storage::{MemoryStore, SharedStore};
use azlan_storefront::{AppState, StorefrontConfig, config::WooConfig};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Credentials the fake store accepts for basic auth.
pub const CONSUMER_KEY: &str = "ck_integration";
pub const CONSUMER_SECRET: &str = "cs_integration";

/// First id handed out to created orders.
const FIRST_ORDER_ID: u64 = 5001;

// =============================================================================
// Backend state
// =============================================================================

/// A customer the fake JWT endpoint will log in.
#[derive(Debug, Clone)]
pub struct FakeCustomer {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub token: String,
}

/// Everything the fake store knows and has been sent.
#[derive(Debug)]
pub struct Backend {
    pub products: Vec<Value>,
    pub coupons: Vec<Value>,
    pub customers: Vec<FakeCustomer>,
    /// Orders created so far, as stored (payload plus id/number/status).
    pub orders: Vec<Value>,
    /// Largest page the product listing serves, whatever `per_page` asks for.
    pub page_limit: usize,
    /// Reject every order with a 400.
    pub fail_orders: bool,
    /// Answer product listings with a 500.
    pub fail_products: bool,
    /// Number of product listing requests served.
    pub listing_requests: usize,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            coupons: Vec::new(),
            customers: Vec::new(),
            orders: Vec::new(),
            page_limit: 100,
            fail_orders: false,
            fail_products: false,
            listing_requests: 0,
        }
    }
}

impl Backend {
    #[must_use]
    pub fn with_products(mut self, products: Vec<Value>) -> Self {
        self.products = products;
        self
    }

    #[must_use]
    pub fn with_coupons(mut self, coupons: Vec<Value>) -> Self {
        self.coupons = coupons;
        self
    }

    #[must_use]
    pub fn with_customer(mut self, customer: FakeCustomer) -> Self {
        self.customers.push(customer);
        self
    }

    #[must_use]
    pub const fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }
}

type Shared = Arc<Mutex<Backend>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Backend> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Fixtures
// =============================================================================

/// A raw WooCommerce product record with string prices, as the API sends it.
#[must_use]
pub fn product_json(id: u64, name: &str, price: &str, sale_price: &str, category: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "price": price,
        "regular_price": price,
        "sale_price": sale_price,
        "stock_status": "instock",
        "stock_quantity": null,
        "categories": [{ "id": 1, "name": category, "slug": category.to_lowercase() }],
        "images": [{ "src": format!("https://cdn.example.com/{id}.jpg"), "alt": name }],
    })
}

/// A customer with a deterministic token derived from the id.
#[must_use]
pub fn customer(id: u64, email: &str, password: &str, display_name: &str) -> FakeCustomer {
    FakeCustomer {
        id,
        email: email.to_string(),
        password: password.to_string(),
        display_name: display_name.to_string(),
        token: format!("token-for-{id}"),
    }
}

// =============================================================================
// Server
// =============================================================================

/// A running fake store. The server stops when this is dropped.
pub struct FakeWoo {
    addr: SocketAddr,
    backend: Shared,
    handle: JoinHandle<()>,
}

impl Drop for FakeWoo {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FakeWoo {
    /// Bind to `127.0.0.1:0` and start serving `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start(backend: Backend) -> Self {
        let backend: Shared = Arc::new(Mutex::new(backend));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake WooCommerce listener");
        let addr = listener.local_addr().expect("listener address");

        let app = router(Arc::clone(&backend));
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "fake WooCommerce server stopped");
            }
        });

        Self {
            addr,
            backend,
            handle,
        }
    }

    /// REST base URL, e.g. `http://127.0.0.1:PORT/wp-json/wc/v3`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/wp-json/wc/v3", self.addr)
    }

    /// Lock the backend to seed or inspect it.
    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        lock(&self.backend)
    }

    /// Storefront configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected, which would be a harness bug.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            woo: WooConfig::new(
                &self.base_url(),
                CONSUMER_KEY,
                SecretString::from(CONSUMER_SECRET),
            )
            .expect("fake base URL is valid"),
            feed_url: format!("http://{}/products.json", self.addr),
            data_dir: std::env::temp_dir().join("azlan-integration"),
            shipping_fee: Decimal::new(500, 0),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// App state over an in-memory store, with notices recorded.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn app_state(&self) -> (AppState, MemoryStore, RecordingNotifier) {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let shared: SharedStore = Arc::new(store.clone());
        let state = AppState::new(self.config(), shared, Arc::new(notifier.clone()))
            .expect("build app state");
        (state, store, notifier)
    }
}

fn router(backend: Shared) -> Router {
    Router::new()
        .route("/wp-json/wc/v3/products", get(list_products))
        .route("/wp-json/wc/v3/products/{id}", get(get_product))
        .route("/wp-json/wc/v3/orders", get(list_orders).post(create_order))
        .route("/wp-json/wc/v3/coupons", get(list_coupons))
        .route("/wp-json/wc/v3/customers/me", get(current_customer))
        .route("/wp-json/jwt-auth/v1/token", post(issue_token))
        .route("/products.json", get(product_feed))
        .with_state(backend)
}

// =============================================================================
// Handlers
// =============================================================================

fn wp_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "code": code, "message": message, "data": { "status": status.as_u16() } })),
    )
        .into_response()
}

fn has_store_auth(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

async fn list_products(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if !has_store_auth(&headers) {
        return wp_error(StatusCode::UNAUTHORIZED, "woocommerce_rest_cannot_view", "Sorry, you cannot list resources.");
    }
    let mut backend = lock(&backend);
    backend.listing_requests += 1;
    if backend.fail_products {
        return wp_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Database unavailable");
    }

    let per_page = query.per_page.unwrap_or(10).clamp(1, backend.page_limit.max(1));
    let page = query.page.unwrap_or(1).max(1);
    let total = backend.products.len();
    let total_pages = total.div_ceil(per_page);
    let items: Vec<Value> = backend
        .products
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    (
        [
            ("x-wp-total", total.to_string()),
            ("x-wp-totalpages", total_pages.to_string()),
        ],
        Json(Value::Array(items)),
    )
        .into_response()
}

async fn get_product(State(backend): State<Shared>, Path(id): Path<u64>) -> Response {
    let backend = lock(&backend);
    backend
        .products
        .iter()
        .find(|p| p.get("id").and_then(Value::as_u64) == Some(id))
        .map_or_else(
            || wp_error(StatusCode::NOT_FOUND, "woocommerce_rest_product_invalid_id", "Invalid ID."),
            |p| Json(p.clone()).into_response(),
        )
}

async fn create_order(State(backend): State<Shared>, Json(payload): Json<Value>) -> Response {
    let mut backend = lock(&backend);
    if backend.fail_orders {
        return wp_error(
            StatusCode::BAD_REQUEST,
            "woocommerce_rest_invalid_product_id",
            "Invalid product ID.",
        );
    }

    let id = FIRST_ORDER_ID + u64::try_from(backend.orders.len()).unwrap_or(u64::MAX - FIRST_ORDER_ID);
    let mut order = payload;
    if let Some(object) = order.as_object_mut() {
        object.insert("id".to_string(), json!(id));
        object.insert("number".to_string(), json!(id.to_string()));
        object.insert("currency".to_string(), json!("PKR"));
        object.insert("date_created".to_string(), json!("2025-06-01T12:00:00"));
    }
    backend.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

#[derive(Debug, Deserialize)]
struct OrderQuery {
    customer: Option<u64>,
}

async fn list_orders(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<OrderQuery>,
) -> Response {
    let backend = lock(&backend);
    let caller = bearer(&headers).and_then(|token| backend.customers.iter().find(|c| c.token == token));
    let Some(caller) = caller else {
        return wp_error(StatusCode::UNAUTHORIZED, "jwt_auth_invalid_token", "Wrong token.");
    };
    if query.customer != Some(caller.id) {
        return wp_error(StatusCode::FORBIDDEN, "woocommerce_rest_cannot_view", "Sorry, you cannot list resources.");
    }

    let orders: Vec<Value> = backend
        .orders
        .iter()
        .filter(|o| o.get("customer_id").and_then(Value::as_u64) == Some(caller.id))
        .rev()
        .cloned()
        .collect();
    Json(Value::Array(orders)).into_response()
}

#[derive(Debug, Deserialize)]
struct CouponQuery {
    code: Option<String>,
}

async fn list_coupons(State(backend): State<Shared>, Query(query): Query<CouponQuery>) -> Response {
    let backend = lock(&backend);
    let coupons: Vec<Value> = backend
        .coupons
        .iter()
        .filter(|c| {
            query.code.as_deref().is_none_or(|code| {
                c.get("code")
                    .and_then(Value::as_str)
                    .is_some_and(|have| have.eq_ignore_ascii_case(code))
            })
        })
        .cloned()
        .collect();
    Json(Value::Array(coupons)).into_response()
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    username: String,
    password: String,
}

async fn issue_token(State(backend): State<Shared>, Json(request): Json<TokenRequest>) -> Response {
    let backend = lock(&backend);
    let Some(customer) = backend
        .customers
        .iter()
        .find(|c| c.email.eq_ignore_ascii_case(&request.username))
    else {
        return wp_error(
            StatusCode::FORBIDDEN,
            "[jwt_auth] invalid_email",
            "Unknown email address. Check again or try your username.",
        );
    };
    if customer.password != request.password {
        return wp_error(
            StatusCode::FORBIDDEN,
            "[jwt_auth] incorrect_password",
            "The password you entered is incorrect.",
        );
    }

    Json(json!({
        "token": customer.token,
        "user_id": customer.id,
        "user_email": customer.email,
        "user_nicename": customer.display_name.to_lowercase(),
        "user_display_name": customer.display_name,
    }))
    .into_response()
}

async fn current_customer(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let backend = lock(&backend);
    let Some(customer) = bearer(&headers).and_then(|token| backend.customers.iter().find(|c| c.token == token)) else {
        return wp_error(StatusCode::UNAUTHORIZED, "jwt_auth_invalid_token", "Wrong token.");
    };
    let (first_name, last_name) = customer
        .display_name
        .split_once(' ')
        .unwrap_or((customer.display_name.as_str(), ""));
    Json(json!({
        "id": customer.id,
        "email": customer.email,
        "first_name": first_name,
        "last_name": last_name,
        "username": customer.email,
    }))
    .into_response()
}

/// The secondary feed, built from the same products in Shopify's shape.
async fn product_feed(State(backend): State<Shared>) -> Json<Value> {
    let backend = lock(&backend);
    let products: Vec<Value> = backend
        .products
        .iter()
        .map(|p| {
            json!({
                "id": p.get("id"),
                "title": p.get("name"),
                "handle": p.get("slug"),
                "tags": p.get("tags").cloned().unwrap_or_else(|| json!([])),
                "created_at": p.get("date_created").cloned().unwrap_or(Value::Null),
                "variants": [{ "price": p.get("price"), "compare_at_price": null }],
                "images": p.get("images").cloned().unwrap_or_else(|| json!([])),
            })
        })
        .collect();
    Json(json!({ "products": products }))
}
