//! Wire types for the WooCommerce REST API (`wc/v3`) and the JWT auth plugin.
//!
//! Products are not here: they are normalized into
//! [`crate::catalog::Product`] because the store's product records are too
//! loosely typed to deserialize directly.

use azlan_core::{
    CategoryId, CouponId, CustomerId, DiscountType, OrderId, OrderStatus, PaymentMethod,
    ProductId, ReviewId,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::catalog::Product;
use crate::catalog::normalize::coerce_decimal;

/// Country code stamped on every address this storefront sends.
pub const STORE_COUNTRY: &str = "PK";

// =============================================================================
// Products
// =============================================================================

/// A single page of products plus the pagination headers that came with it.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// From `X-WP-TotalPages`; 1 when the header is missing.
    pub total_pages: u32,
    /// From `X-WP-Total`; 0 when the header is missing.
    pub total_products: u64,
    pub current_page: u32,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Parent category id, 0 for top-level categories.
    #[serde(default)]
    pub parent: u64,
    /// Number of published products in the category.
    #[serde(default)]
    pub count: u64,
}

// =============================================================================
// Customers & Auth
// =============================================================================

/// Response of the JWT plugin's `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Older plugin versions omit the user id.
    #[serde(default)]
    pub user_id: Option<CustomerId>,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_display_name: String,
}

/// A billing or shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    /// Billing only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Billing only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields collected by the sign-up form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: SecretString,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
}

impl Registration {
    /// Request body for `POST /customers`. The username is the email.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "password": self.password.expose_secret(),
            "username": self.email,
            "billing": Address {
                email: Some(self.email.clone()),
                phone: Some(self.phone.clone()),
                ..self.shipping_address()
            },
            "shipping": self.shipping_address(),
        })
    }

    fn shipping_address(&self) -> Address {
        Address {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address_1: self.address.clone(),
            city: self.city.clone(),
            postcode: self.postcode.clone(),
            country: STORE_COUNTRY.to_string(),
            email: None,
            phone: None,
        }
    }
}

/// Fields editable from the account page.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
}

impl ProfileUpdate {
    /// Request body for `PUT /customers/{id}`.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "first_name": self.first_name,
            "last_name": self.last_name,
            "email": self.email,
            "billing": Address {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                address_1: self.address.clone(),
                city: self.city.clone(),
                postcode: self.postcode.clone(),
                country: STORE_COUNTRY.to_string(),
                email: Some(self.email.clone()),
                phone: Some(self.phone.clone()),
            },
        })
    }
}

/// A customer record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub billing: Address,
    #[serde(default)]
    pub shipping: Address,
}

impl Customer {
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    pub payment_method: String,
    pub payment_method_title: String,
    pub set_paid: bool,
    pub status: OrderStatus,
    /// 0 for guest checkout.
    pub customer_id: u64,
    pub billing: Address,
    pub shipping: Address,
    pub line_items: Vec<LineItem>,
    pub shipping_lines: Vec<ShippingLine>,
    pub customer_note: String,
    pub coupon_lines: Vec<CouponLine>,
}

impl OrderPayload {
    /// Fill the payment fields from a [`PaymentMethod`].
    pub fn set_payment(&mut self, method: PaymentMethod) {
        self.payment_method = method.id().to_string();
        self.payment_method_title = method.title().to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingLine {
    pub method_id: String,
    pub method_title: String,
    /// WooCommerce expects money as a string here.
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponLine {
    pub code: String,
}

/// A line on a stored order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderLine {
    #[serde(default)]
    pub name: String,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// An order as returned by the store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub number: String,
    /// Raw status; plugins can add statuses outside [`OrderStatus`].
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub payment_method_title: String,
    #[serde(default)]
    pub customer_id: u64,
    #[serde(default)]
    pub billing: Address,
    #[serde(default)]
    pub customer_note: String,
    #[serde(default)]
    pub line_items: Vec<OrderLine>,
}

impl Order {
    /// The status as a known [`OrderStatus`], if it is one.
    #[must_use]
    pub fn known_status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// A coupon as returned by `GET /coupons`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    /// Store-local expiry; `None` means the coupon never expires.
    #[serde(default)]
    pub date_expires: Option<NaiveDateTime>,
    /// The same expiry in UTC, when the store sends it.
    #[serde(default)]
    pub date_expires_gmt: Option<NaiveDateTime>,
    /// `0` means no minimum.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub minimum_amount: Decimal,
    #[serde(default)]
    pub description: String,
}

impl Coupon {
    /// Expiry as a UTC instant, preferring the GMT field over the
    /// store-local one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.date_expires_gmt
            .or(self.date_expires)
            .map(|naive| naive.and_utc())
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A product review.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    #[serde(default)]
    pub reviewer: String,
    /// HTML body.
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
}

/// Body of `POST /products/reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub review: String,
    pub reviewer: String,
    pub reviewer_email: String,
    /// 1 to 5.
    pub rating: u8,
}

/// Accepts money as a string (`"10.00"`), a number, empty string or null.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_decimal(&value).unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_from_woocommerce_json() {
        let coupon: Coupon = serde_json::from_value(json!({
            "id": 719,
            "code": "eid10",
            "amount": "10.00",
            "discount_type": "percent",
            "date_expires": "2030-06-30T00:00:00",
            "minimum_amount": "",
            "usage_count": 4
        }))
        .unwrap();

        assert_eq!(coupon.amount, Decimal::new(10, 0));
        assert_eq!(coupon.discount_type, DiscountType::Percent);
        assert_eq!(coupon.minimum_amount, Decimal::ZERO);
        assert!(coupon.date_expires.is_some());
    }

    #[test]
    fn test_coupon_without_expiry() {
        let coupon: Coupon = serde_json::from_value(json!({
            "id": 1,
            "code": "flat200",
            "amount": "200.00",
            "discount_type": "fixed_cart",
            "date_expires": null,
            "minimum_amount": "1500.00"
        }))
        .unwrap();
        assert_eq!(coupon.date_expires, None);
        assert_eq!(coupon.minimum_amount, Decimal::new(1500, 0));
    }

    #[test]
    fn test_order_tolerates_unknown_status() {
        let order: Order = serde_json::from_value(json!({
            "id": 5123,
            "status": "ready-to-ship",
            "total": "2500.00",
            "date_created": "2025-03-01T12:30:00",
            "line_items": [{"name": "Kurta", "product_id": 11, "quantity": 2, "total": "2000.00"}]
        }))
        .unwrap();
        assert_eq!(order.known_status(), None);
        assert_eq!(order.total, Decimal::new(2500, 0));
        assert_eq!(order.line_items[0].quantity, 2);
    }

    #[test]
    fn test_registration_payload_uses_email_as_username() {
        let reg = Registration {
            email: "sana@example.com".to_string(),
            first_name: "Sana".to_string(),
            last_name: "Malik".to_string(),
            password: SecretString::from("s3cret-pass".to_string()),
            phone: "03001234567".to_string(),
            address: "12 Mall Road".to_string(),
            city: "Lahore".to_string(),
            postcode: "54000".to_string(),
        };
        let payload = reg.to_payload();
        assert_eq!(payload["username"], "sana@example.com");
        assert_eq!(payload["billing"]["country"], STORE_COUNTRY);
        assert_eq!(payload["billing"]["phone"], "03001234567");
        assert!(payload["shipping"].get("email").is_none());
        assert_eq!(payload["password"], "s3cret-pass");
    }

    #[test]
    fn test_customer_display_name_falls_back_to_username() {
        let customer: Customer =
            serde_json::from_value(json!({"id": 3, "username": "sana"})).unwrap();
        assert_eq!(customer.display_name(), "sana");
    }
}
