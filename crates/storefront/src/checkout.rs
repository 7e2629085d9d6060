//! Checkout: form validation, order payload assembly and submission.
//!
//! Orders are submitted exactly once. A failure leaves the cart untouched so
//! the customer can try again; nothing is retried automatically.

use azlan_core::{CustomerId, Email, EmailError, OrderId, OrderStatus, PaymentMethod};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::instrument;

use crate::cart::{Cart, CartEntry};
use crate::coupon::AppliedCoupon;
use crate::notify::{Notice, Notifier};
use crate::woo::{
    Address, CouponLine, LineItem, OrderPayload, STORE_COUNTRY, ShippingLine, WooClient, WooError,
};

/// Flat shipping fee charged on every order.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Tax shown on the checkout summary. It is never sent to the store.
pub const DISPLAY_TAX: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Where the customer goes after a successful order.
pub const THANK_YOU_PATH: &str = "/thank-you";

const SHIPPING_METHOD_ID: &str = "flat_rate";
const SHIPPING_METHOD_TITLE: &str = "Standard Shipping";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Some items are unavailable: {}", .0.join("; "))]
    OutOfStock(Vec<String>),

    #[error("Failed to create order: {0}")]
    Order(#[from] WooError),
}

// =============================================================================
// Form
// =============================================================================

/// Billing and shipping details entered at checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    /// Full name; split on the first space into first and last name.
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal: String,
    pub phone: String,
    pub notes: String,
}

impl CheckoutForm {
    /// Check required fields and parse the email.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` for the first blank required
    /// field, or `CheckoutError::InvalidEmail`.
    pub fn validate(&self) -> Result<Email, CheckoutError> {
        let required = [
            ("Name", &self.name),
            ("Email", &self.email),
            ("Address", &self.address),
            ("City", &self.city),
            ("Phone", &self.phone),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CheckoutError::MissingField(*field));
        }
        Ok(Email::parse(&self.email)?)
    }

    /// `("Ayesha", "Khan Malik")` for `"Ayesha Khan Malik"`.
    #[must_use]
    pub fn split_name(&self) -> (String, String) {
        let name = self.name.trim();
        match name.split_once(' ') {
            Some((first, last)) => (first.to_string(), last.trim().to_string()),
            None => (name.to_string(), String::new()),
        }
    }

    fn shipping_address(&self) -> Address {
        let (first_name, last_name) = self.split_name();
        Address {
            first_name,
            last_name,
            address_1: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postcode: self.postal.trim().to_string(),
            country: STORE_COUNTRY.to_string(),
            email: None,
            phone: None,
        }
    }
}

// =============================================================================
// Payload & totals
// =============================================================================

/// Everything needed to place an order besides the cart itself.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub form: CheckoutForm,
    pub payment: PaymentMethod,
    /// `None` for guest checkout.
    pub customer_id: Option<CustomerId>,
    pub coupon: Option<AppliedCoupon>,
    pub shipping_fee: Decimal,
    /// Re-check stock with the store before submitting.
    pub check_stock: bool,
}

impl OrderRequest {
    #[must_use]
    pub fn new(form: CheckoutForm, payment: PaymentMethod) -> Self {
        Self {
            form,
            payment,
            customer_id: None,
            coupon: None,
            shipping_fee: SHIPPING_FEE,
            check_stock: false,
        }
    }
}

/// Assemble the `POST /orders` body.
#[must_use]
pub fn build_order_payload(entries: &[CartEntry], request: &OrderRequest) -> OrderPayload {
    let form = &request.form;
    let shipping = form.shipping_address();
    let billing = Address {
        email: Some(form.email.trim().to_string()),
        phone: Some(form.phone.trim().to_string()),
        ..shipping.clone()
    };

    let mut payload = OrderPayload {
        payment_method: String::new(),
        payment_method_title: String::new(),
        set_paid: false,
        status: OrderStatus::Pending,
        customer_id: request.customer_id.map_or(0, |id| id.as_u64()),
        billing,
        shipping,
        line_items: entries
            .iter()
            .map(|e| LineItem {
                product_id: e.product.id,
                quantity: e.quantity,
            })
            .collect(),
        shipping_lines: vec![ShippingLine {
            method_id: SHIPPING_METHOD_ID.to_string(),
            method_title: SHIPPING_METHOD_TITLE.to_string(),
            total: request.shipping_fee.normalize().to_string(),
        }],
        customer_note: form.notes.trim().to_string(),
        coupon_lines: request
            .coupon
            .iter()
            .map(|c| CouponLine {
                code: c.code.clone(),
            })
            .collect(),
    };
    payload.set_payment(request.payment);
    payload
}

/// Order summary figures, each rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    /// `subtotal + tax + shipping - discount`.
    pub total: Decimal,
}

impl OrderTotals {
    #[must_use]
    pub fn compute(subtotal: Decimal, shipping: Decimal, tax: Decimal, discount: Decimal) -> Self {
        let round = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal: round(subtotal),
            tax: round(tax),
            shipping: round(shipping),
            discount: round(discount),
            total: round(subtotal + tax + shipping - discount),
        }
    }

    /// Summary for `cart` as shown on the checkout page.
    #[must_use]
    pub fn for_cart(cart: &Cart, shipping: Decimal, coupon: Option<&AppliedCoupon>) -> Self {
        Self::compute(
            cart.total(),
            shipping,
            DISPLAY_TAX,
            coupon.map_or(Decimal::ZERO, |c| c.discount),
        )
    }
}

// =============================================================================
// Stock validation
// =============================================================================

/// Problems found when re-checking cart lines against the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReport {
    pub errors: Vec<String>,
}

impl StockReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fetch each cart product in turn and check it can still be bought in the
/// requested quantity.
#[instrument(skip_all, fields(lines = entries.len()))]
pub async fn validate_stock(client: &WooClient, entries: &[CartEntry]) -> StockReport {
    let mut report = StockReport::default();
    for entry in entries {
        match client.fetch_product(entry.product.id).await {
            Ok(product) if !product.stock_status.is_in_stock() => {
                report.errors.push(format!("{} is out of stock", product.name));
            }
            Ok(product) => {
                if let Some(available) = product.stock_quantity
                    && available != 0
                    && i64::from(entry.quantity) > available
                {
                    report
                        .errors
                        .push(format!("Only {available} of {} available", product.name));
                }
            }
            Err(e) => {
                tracing::warn!(product_id = %entry.product.id, error = %e, "stock check failed");
                let label = if entry.product.name.is_empty() {
                    entry.product.id.to_string()
                } else {
                    entry.product.name.clone()
                };
                report.errors.push(format!("Error validating {label}"));
            }
        }
    }
    report
}

// =============================================================================
// Submission
// =============================================================================

/// What the front end needs after a successful order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub redirect: &'static str,
}

/// Validate, submit the cart as an order, and clear the cart on success.
///
/// # Errors
///
/// Returns `CheckoutError` if the cart is empty, the form is invalid, stock
/// validation fails, or the store rejects the order. The cart is left
/// intact in every error case.
#[instrument(skip_all, fields(payment = %request.payment))]
pub async fn place_order(
    client: &WooClient,
    cart: &mut Cart,
    request: &OrderRequest,
    notifier: &dyn Notifier,
) -> Result<OrderConfirmation, CheckoutError> {
    if cart.is_empty() {
        notifier.notify(Notice::error("Your cart is empty"));
        return Err(CheckoutError::EmptyCart);
    }
    if let Err(e) = request.form.validate() {
        notifier.notify(Notice::error(e.to_string()));
        return Err(e);
    }

    if request.check_stock {
        let report = validate_stock(client, cart.entries()).await;
        if !report.is_valid() {
            for error in &report.errors {
                notifier.notify(Notice::error(error.clone()));
            }
            return Err(CheckoutError::OutOfStock(report.errors));
        }
    }

    let payload = build_order_payload(cart.entries(), request);
    match client.create_order(&payload).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, total = %order.total, "order created");
            cart.clear();
            notifier.notify(Notice::success(format!(
                "Order #{} created successfully!",
                order.id
            )));
            Ok(OrderConfirmation {
                order_id: order.id,
                redirect: THANK_YOU_PATH,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "order submission failed");
            notifier.notify(Notice::error("Failed to create order. Please try again."));
            Err(CheckoutError::Order(e))
        }
    }
}
