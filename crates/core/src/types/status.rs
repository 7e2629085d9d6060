//! Status enums for products, orders, payments and coupons.
//!
//! Wire values follow the WooCommerce REST API (`instock`, `on-hold`,
//! `fixed_cart`, ...).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Product stock status.
///
/// Unknown values from the backend are preserved in [`StockStatus::Other`]
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
    Other(String),
}

impl StockStatus {
    /// The WooCommerce wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InStock => "instock",
            Self::OutOfStock => "outofstock",
            Self::OnBackorder => "onbackorder",
            Self::Other(s) => s,
        }
    }

    /// Whether the product can be bought right now.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

impl From<&str> for StockStatus {
    fn from(s: &str) -> Self {
        match s {
            "instock" => Self::InStock,
            "outofstock" => Self::OutOfStock,
            "onbackorder" => Self::OnBackorder,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for StockStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<StockStatus> for String {
    fn from(status: StockStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status as stored by WooCommerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
    CheckoutDraft,
    Trash,
}

impl OrderStatus {
    /// The WooCommerce wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
            Self::CheckoutDraft => "checkout-draft",
            Self::Trash => "trash",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            "checkout-draft" => Ok(Self::CheckoutDraft),
            "trash" => Ok(Self::Trash),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment method label passed through to the order payload.
///
/// No payment is processed; the method only tells the store how the
/// customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Credit or debit card.
    Card,
    /// Direct bank transfer.
    Bacs,
    /// Easypaisa mobile wallet.
    Easypaisa,
}

impl PaymentMethod {
    /// The `payment_method` id sent to WooCommerce.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Card => "card",
            Self::Bacs => "bacs",
            Self::Easypaisa => "easypaisa",
        }
    }

    /// Human readable `payment_method_title`.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Card => "Credit/Debit Card",
            Self::Bacs => "Direct Bank Transfer",
            Self::Easypaisa => "Easypaisa",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "card" => Ok(Self::Card),
            "bacs" => Ok(Self::Bacs),
            // The checkout form labels the wallet option "upi"
            "easypaisa" | "upi" => Ok(Self::Easypaisa),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// How a coupon's `amount` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `amount` is a percentage of the cart total.
    Percent,
    /// `amount` is a fixed discount on the cart.
    #[default]
    FixedCart,
    /// `amount` is a fixed discount per product.
    FixedProduct,
    #[serde(other)]
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_keeps_unknown_values() {
        let status: StockStatus = serde_json::from_str("\"preorder\"").unwrap();
        assert_eq!(status, StockStatus::Other("preorder".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"preorder\"");
        assert!(!status.is_in_stock());
    }

    #[test]
    fn test_stock_status_known_values() {
        assert!(StockStatus::from("instock").is_in_stock());
        assert_eq!(StockStatus::from("outofstock"), StockStatus::OutOfStock);
        assert_eq!(
            serde_json::to_string(&StockStatus::OnBackorder).unwrap(),
            "\"onbackorder\""
        );
    }

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OnHold).unwrap(),
            "\"on-hold\""
        );
        assert_eq!("on-hold".parse::<OrderStatus>().unwrap(), OrderStatus::OnHold);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_titles() {
        assert_eq!(PaymentMethod::Cod.title(), "Cash on Delivery");
        assert_eq!(PaymentMethod::Bacs.title(), "Direct Bank Transfer");
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Easypaisa);
    }

    #[test]
    fn test_discount_type_unknown_maps_to_other() {
        let t: DiscountType = serde_json::from_str("\"percent\"").unwrap();
        assert_eq!(t, DiscountType::Percent);
        let t: DiscountType = serde_json::from_str("\"sign_up_fee\"").unwrap();
        assert_eq!(t, DiscountType::Other);
    }
}
