//! WooCommerce REST client implementation.
//!
//! Uses `reqwest` for HTTP and caches products and categories with `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use azlan_core::{CustomerId, OrderId, OrderStatus, ProductId};
use moka::future::Cache;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::WooError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    Category, Coupon, Customer, NewReview, Order, OrderPayload, ProductPage, ProfileUpdate,
    Registration, Review, TokenResponse,
};
use crate::catalog::Product;
use crate::catalog::normalize::{normalize_product, normalize_products};
use crate::config::WooConfig;

/// WooCommerce caps `per_page` at 100.
const MAX_PER_PAGE: u32 = 100;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a request authenticates.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// Consumer key/secret over HTTP basic auth.
    Store,
    /// A customer's JWT.
    Bearer(&'a str),
}

impl<'a> Auth<'a> {
    /// Bearer auth when a token is available, store auth otherwise.
    #[must_use]
    pub fn customer(token: Option<&'a str>) -> Self {
        token.map_or(Self::Store, Self::Bearer)
    }
}

// =============================================================================
// WooClient
// =============================================================================

/// Client for the WooCommerce REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct WooClient {
    inner: Arc<WooClientInner>,
}

struct WooClientInner {
    client: reqwest::Client,
    base_url: String,
    jwt_url: String,
    consumer_key: String,
    consumer_secret: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for WooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooClient")
            .field("base_url", &self.inner.base_url)
            .field("jwt_url", &self.inner.jwt_url)
            .finish_non_exhaustive()
    }
}

impl WooClient {
    /// Create a new WooCommerce client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &WooConfig) -> Result<Self, WooError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(WooClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                jwt_url: config.jwt_url.trim_end_matches('/').to_string(),
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                cache,
            }),
        })
    }

    fn request(&self, method: Method, path: &str, auth: Auth<'_>) -> RequestBuilder {
        let url = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        let builder = self.inner.client.request(method, url);
        match auth {
            Auth::Store => builder.basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            ),
            Auth::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(request: RequestBuilder) -> Result<Response, WooError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(WooError::RateLimited(retry_after(response.headers())));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "WooCommerce API returned non-success status"
            );
            return Err(WooError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, WooError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse WooCommerce response"
            );
            WooError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth: Auth<'_>,
    ) -> Result<T, WooError> {
        let response = Self::send(self.request(Method::GET, path, auth).query(query)).await?;
        Self::parse(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
        auth: Auth<'_>,
    ) -> Result<T, WooError> {
        let response = Self::send(self.request(method, path, auth).json(body)).await?;
        Self::parse(response).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch every product, following `X-WP-TotalPages`.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, WooError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.products_page(page, MAX_PER_PAGE).await?;
            all.extend(batch.products);
            if page >= batch.total_pages {
                break;
            }
            page += 1;
        }
        tracing::info!(count = all.len(), pages = page, "Fetched products");

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::new(all.clone())))
            .await;

        Ok(all)
    }

    /// Fetch one page of products with its pagination headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_page(&self, page: u32, per_page: u32) -> Result<ProductPage, WooError> {
        let page = page.max(1);
        let request = self.request(Method::GET, "products", Auth::Store).query(&[
            ("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()),
            ("page", page.to_string()),
        ]);
        let response = Self::send(request).await?;
        let total_pages = header_number(response.headers(), "x-wp-totalpages").unwrap_or(1);
        let total_products = header_number(response.headers(), "x-wp-total").unwrap_or(0);
        let raw: Value = Self::parse(response).await?;

        Ok(ProductPage {
            products: normalize_products(&raw),
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX).max(1),
            total_products,
            current_page: page,
        })
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, WooError> {
        if let Some(CacheValue::Product(product)) =
            self.inner.cache.get(&CacheKey::Product(id)).await
        {
            debug!("Cache hit for product");
            return Ok(*product);
        }
        self.fetch_product(id).await
    }

    /// Fetch a single product bypassing the cache, then cache the result.
    ///
    /// Used where stale stock data matters, such as pre-checkout validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: ProductId) -> Result<Product, WooError> {
        let raw: Value = self
            .get(&format!("products/{id}"), &[], Auth::Store)
            .await
            .map_err(|e| not_found_on_404(e, format!("product {id}")))?;
        let product = normalize_product(&raw)
            .ok_or_else(|| WooError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(
                CacheKey::Product(id),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;

        Ok(product)
    }

    /// Server-side product search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str, limit: u32) -> Result<Vec<Product>, WooError> {
        let raw: Value = self
            .get(
                "products",
                &[
                    ("search", query.to_string()),
                    ("per_page", limit.clamp(1, MAX_PER_PAGE).to_string()),
                ],
                Auth::Store,
            )
            .await?;
        Ok(normalize_products(&raw))
    }

    /// Create a product from a raw WooCommerce product body.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response has no id.
    #[instrument(skip(self, body))]
    pub async fn create_product(&self, body: &Value) -> Result<Product, WooError> {
        let raw: Value = self
            .send_json(Method::POST, "products", body, Auth::Store)
            .await?;
        self.invalidate_products().await;
        normalize_product(&raw).ok_or_else(|| WooError::NotFound("created product".to_string()))
    }

    /// Update a product with a partial WooCommerce product body.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, body), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, body: &Value) -> Result<Product, WooError> {
        let raw: Value = self
            .send_json(Method::PUT, &format!("products/{id}"), body, Auth::Store)
            .await
            .map_err(|e| not_found_on_404(e, format!("product {id}")))?;
        self.invalidate_products().await;
        normalize_product(&raw).ok_or_else(|| WooError::NotFound(format!("product {id}")))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), WooError> {
        let request = self.request(Method::DELETE, &format!("products/{id}"), Auth::Store);
        Self::send(request)
            .await
            .map_err(|e| not_found_on_404(e, format!("product {id}")))?;
        self.invalidate_products().await;
        Ok(())
    }

    async fn invalidate_products(&self) {
        // Single-product entries are few; dropping everything keeps list and
        // detail views consistent after an edit.
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Fetch product categories (first 100).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, WooError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let categories: Vec<Category> = self
            .get(
                "products/categories",
                &[("per_page", MAX_PER_PAGE.to_string())],
                Auth::Store,
            )
            .await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails (e.g. the email is taken).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register_customer(
        &self,
        registration: &Registration,
    ) -> Result<Customer, WooError> {
        self.send_json(
            Method::POST,
            "customers",
            &registration.to_payload(),
            Auth::Store,
        )
        .await
    }

    /// Exchange credentials for a JWT.
    ///
    /// # Errors
    ///
    /// Returns `WooError::Api` with the plugin's message on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, WooError> {
        let request = self
            .inner
            .client
            .post(format!("{}/token", self.inner.jwt_url))
            .json(&json!({ "username": email, "password": password }));
        let response = Self::send(request).await?;
        Self::parse(response).await
    }

    /// Fetch the logged-in customer's own profile.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotAuthenticated` without a token, or an API error.
    #[instrument(skip_all)]
    pub async fn customer_profile(&self, token: Option<&str>) -> Result<Customer, WooError> {
        let token = token.ok_or(WooError::NotAuthenticated)?;
        self.get("customers/me", &[], Auth::Bearer(token)).await
    }

    /// Fetch a customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is not found or the API request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn customer(&self, id: CustomerId) -> Result<Customer, WooError> {
        self.get(&format!("customers/{id}"), &[], Auth::Store)
            .await
            .map_err(|e| not_found_on_404(e, format!("customer {id}")))
    }

    /// Update a customer's profile and billing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        update: &ProfileUpdate,
    ) -> Result<Customer, WooError> {
        self.send_json(
            Method::PUT,
            &format!("customers/{id}"),
            &update.to_payload(),
            Auth::Store,
        )
        .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, payload), fields(items = payload.line_items.len()))]
    pub async fn create_order(&self, payload: &OrderPayload) -> Result<Order, WooError> {
        let body = serde_json::to_value(payload)?;
        self.send_json(Method::POST, "orders", &body, Auth::Store)
            .await
    }

    /// A customer's most recent orders (up to 50, newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(customer_id = %customer_id))]
    pub async fn customer_orders(
        &self,
        customer_id: CustomerId,
        token: Option<&str>,
    ) -> Result<Vec<Order>, WooError> {
        self.get(
            "orders",
            &[
                ("customer", customer_id.to_string()),
                ("per_page", "50".to_string()),
                ("orderby", "date".to_string()),
                ("order", "desc".to_string()),
            ],
            Auth::customer(token),
        )
        .await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: OrderId) -> Result<Order, WooError> {
        self.get(&format!("orders/{id}"), &[], Auth::Store)
            .await
            .map_err(|e| not_found_on_404(e, format!("order {id}")))
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, WooError> {
        self.send_json(
            Method::PUT,
            &format!("orders/{id}"),
            &json!({ "status": status }),
            Auth::Store,
        )
        .await
        .map_err(|e| not_found_on_404(e, format!("order {id}")))
    }

    /// Permanently delete an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), WooError> {
        let request = self
            .request(Method::DELETE, &format!("orders/{id}"), Auth::Store)
            .query(&[("force", "true")]);
        Self::send(request)
            .await
            .map_err(|e| not_found_on_404(e, format!("order {id}")))?;
        Ok(())
    }

    // =========================================================================
    // Coupon Methods
    // =========================================================================

    /// Fetch coupons (first 100).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn coupons(&self) -> Result<Vec<Coupon>, WooError> {
        self.get(
            "coupons",
            &[("per_page", MAX_PER_PAGE.to_string())],
            Auth::Store,
        )
        .await
    }

    /// Look a coupon up by its code.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no coupon has this code.
    #[instrument(skip(self))]
    pub async fn coupon_by_code(&self, code: &str) -> Result<Coupon, WooError> {
        let coupons: Vec<Coupon> = self
            .get("coupons", &[("code", code.to_string())], Auth::Store)
            .await?;
        coupons
            .into_iter()
            .next()
            .ok_or_else(|| WooError::NotFound(format!("coupon {code}")))
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// Reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, WooError> {
        self.get(
            "products/reviews",
            &[("product", product_id.to_string())],
            Auth::Store,
        )
        .await
    }

    /// Post a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, review, token), fields(product_id = %review.product_id))]
    pub async fn create_review(
        &self,
        review: &NewReview,
        token: Option<&str>,
    ) -> Result<Review, WooError> {
        let body = serde_json::to_value(review)?;
        self.send_json(
            Method::POST,
            "products/reviews",
            &body,
            Auth::customer(token),
        )
        .await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

fn retry_after(headers: &HeaderMap) -> u64 {
    header_number(headers, "retry-after").unwrap_or(1)
}

/// Pull the human-readable `message` out of a WordPress error body, falling
/// back to the (truncated) raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn not_found_on_404(err: WooError, what: String) -> WooError {
    match err {
        WooError::Api { status: 404, .. } => WooError::NotFound(what),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_error_message_prefers_wordpress_message() {
        let body = r#"{"code":"woocommerce_rest_invalid_coupon","message":"Coupon is not valid.","data":{"status":400}}"#;
        assert_eq!(error_message(body), "Coupon is not valid.");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("<html>502</html>"), "<html>502</html>");
        assert_eq!(error_message(&"x".repeat(300)).len(), 200);
    }

    #[test]
    fn test_pagination_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-wp-totalpages", HeaderValue::from_static("4"));
        headers.insert("x-wp-total", HeaderValue::from_static(" 37 "));
        assert_eq!(header_number(&headers, "x-wp-totalpages"), Some(4));
        assert_eq!(header_number(&headers, "x-wp-total"), Some(37));
        assert_eq!(header_number(&headers, "retry-after"), None);
        assert_eq!(retry_after(&headers), 1);
    }

    #[test]
    fn test_404_becomes_not_found() {
        let err = not_found_on_404(
            WooError::Api {
                status: 404,
                message: "Invalid ID.".to_string(),
            },
            "product 9".to_string(),
        );
        assert!(matches!(err, WooError::NotFound(ref what) if what == "product 9"));

        let err = not_found_on_404(WooError::RateLimited(5), "product 9".to_string());
        assert!(matches!(err, WooError::RateLimited(5)));
    }

    #[test]
    fn test_customer_auth_falls_back_to_store() {
        assert!(matches!(Auth::customer(None), Auth::Store));
        assert!(matches!(Auth::customer(Some("jwt")), Auth::Bearer("jwt")));
    }
}
