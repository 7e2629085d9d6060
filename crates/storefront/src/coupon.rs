//! Coupon validation against the cart total.

use azlan_core::{DiscountType, Price};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::instrument;

use crate::woo::{Coupon, WooClient, WooError};

/// Errors that can occur when applying a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    #[error("Please enter a coupon code")]
    EmptyCode,

    #[error("Coupon not found")]
    NotFound(String),

    #[error("Coupon has expired")]
    Expired,

    #[error("Minimum purchase: {}", Price::pkr(*.0))]
    BelowMinimum(Decimal),

    #[error(transparent)]
    Woo(WooError),
}

impl From<WooError> for CouponError {
    fn from(err: WooError) -> Self {
        match err {
            WooError::NotFound(what) => Self::NotFound(what),
            other => Self::Woo(other),
        }
    }
}

/// A coupon that passed validation, with the discount it earns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Decimal,
}

/// Check `coupon` against `cart_total` at time `now` and compute its discount.
///
/// Percent coupons take `amount` percent of the total; every other type is a
/// flat `amount`. The discount never exceeds the cart total and is rounded
/// to 2 decimal places.
///
/// # Errors
///
/// Returns `CouponError::Expired` or `CouponError::BelowMinimum`.
pub fn evaluate(
    coupon: &Coupon,
    cart_total: Decimal,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponError> {
    if coupon.expires_at().is_some_and(|expires| expires < now) {
        return Err(CouponError::Expired);
    }
    if coupon.minimum_amount > Decimal::ZERO && cart_total < coupon.minimum_amount {
        return Err(CouponError::BelowMinimum(coupon.minimum_amount));
    }

    let discount = match coupon.discount_type {
        DiscountType::Percent => cart_total * coupon.amount / Decimal::ONE_HUNDRED,
        DiscountType::FixedCart | DiscountType::FixedProduct | DiscountType::Other => {
            coupon.amount
        }
    };

    Ok(AppliedCoupon {
        code: coupon.code.clone(),
        discount: discount
            .clamp(Decimal::ZERO, cart_total.max(Decimal::ZERO))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    })
}

/// Look up `code` and validate it against the cart.
///
/// # Errors
///
/// Returns `CouponError::NotFound` for an unknown code, the validation
/// errors of [`evaluate`], or the underlying API error.
#[instrument(skip(client))]
pub async fn validate_coupon(
    client: &WooClient,
    code: &str,
    cart_total: Decimal,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CouponError::EmptyCode);
    }
    let coupon = client.coupon_by_code(code).await?;
    let applied = evaluate(&coupon, cart_total, now)?;
    tracing::info!(code = %applied.code, discount = %applied.discount, "coupon applied");
    Ok(applied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn coupon(value: serde_json::Value) -> Coupon {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_percent_discount() {
        let c = coupon(json!({"id": 1, "code": "eid10", "amount": "10", "discount_type": "percent"}));
        let applied = evaluate(&c, Decimal::new(4550, 0), now()).unwrap();
        assert_eq!(applied.discount, Decimal::new(455, 0));
        assert_eq!(applied.code, "eid10");
    }

    #[test]
    fn test_fixed_discount_is_capped_at_total() {
        let c = coupon(json!({"id": 1, "code": "flat", "amount": "500", "discount_type": "fixed_cart"}));
        assert_eq!(
            evaluate(&c, Decimal::new(2000, 0), now()).unwrap().discount,
            Decimal::new(500, 0)
        );
        assert_eq!(
            evaluate(&c, Decimal::new(300, 0), now()).unwrap().discount,
            Decimal::new(300, 0)
        );
    }

    #[test]
    fn test_expired_coupon() {
        let c = coupon(json!({
            "id": 1, "code": "old", "amount": "10", "discount_type": "percent",
            "date_expires": "2025-05-31T00:00:00"
        }));
        assert!(matches!(
            evaluate(&c, Decimal::new(1000, 0), now()),
            Err(CouponError::Expired)
        ));
    }

    #[test]
    fn test_gmt_expiry_wins() {
        let c = coupon(json!({
            "id": 1, "code": "tz", "amount": "10", "discount_type": "percent",
            "date_expires": "2025-05-31T00:00:00",
            "date_expires_gmt": "2025-06-02T00:00:00"
        }));
        assert!(evaluate(&c, Decimal::new(1000, 0), now()).is_ok());
    }

    #[test]
    fn test_minimum_amount() {
        let c = coupon(json!({
            "id": 1, "code": "big", "amount": "200", "discount_type": "fixed_cart",
            "minimum_amount": "3000.00"
        }));
        let err = evaluate(&c, Decimal::new(2999, 0), now()).unwrap_err();
        assert!(matches!(err, CouponError::BelowMinimum(min) if min == Decimal::new(3000, 0)));
        assert_eq!(err.to_string(), "Minimum purchase: Rs. 3,000");

        assert!(evaluate(&c, Decimal::new(3000, 0), now()).is_ok());
    }

    #[test]
    fn test_not_found_maps_from_woo_error() {
        let err = CouponError::from(WooError::NotFound("coupon x".to_string()));
        assert!(matches!(err, CouponError::NotFound(_)));
        assert_eq!(err.to_string(), "Coupon not found");
    }
}
