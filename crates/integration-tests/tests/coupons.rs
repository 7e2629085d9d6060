//! Coupon lookup and validation against the fake store.

#![allow(clippy::unwrap_used)]

use azlan_core::ProductId;
use azlan_integration_tests::{Backend, FakeWoo, product_json};
use azlan_storefront::coupon::CouponError;
use azlan_storefront::{AppError, AppState, NoticeLevel};
use rust_decimal::Decimal;
use serde_json::json;

fn backend() -> Backend {
    Backend::default()
        .with_products(vec![product_json(1, "Lawn Suit", "2500", "", "Women")])
        .with_coupons(vec![
            json!({ "id": 11, "code": "eid10", "amount": "10.00", "discount_type": "percent" }),
            json!({
                "id": 12, "code": "big500", "amount": "500.00", "discount_type": "fixed_cart",
                "minimum_amount": "10000.00"
            }),
            json!({
                "id": 13, "code": "summer2020", "amount": "20.00", "discount_type": "percent",
                "date_expires": "2020-08-31T00:00:00", "date_expires_gmt": "2020-08-31T00:00:00"
            }),
        ])
}

async fn cart_of_two(state: &AppState) {
    let suit = state.woo().product(ProductId::new(1)).await.unwrap();
    state.add_to_cart(&suit, 2).await;
}

#[tokio::test]
async fn test_percent_coupon_discounts_cart() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, notices) = woo.app_state();
    cart_of_two(&state).await;
    notices.drain();

    let applied = state.apply_coupon(" EID10 ").await.unwrap();
    assert_eq!(applied.code, "eid10");
    assert_eq!(applied.discount, Decimal::new(500, 0));

    let totals = state.totals(Some(&applied)).await;
    assert_eq!(totals.subtotal, Decimal::new(5000, 0));
    assert_eq!(totals.discount, Decimal::new(500, 0));
    // 5000 + 200 tax + 500 shipping - 500
    assert_eq!(totals.total, Decimal::new(5200, 0));

    let notices = notices.drain();
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn test_unknown_coupon() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, notices) = woo.app_state();
    cart_of_two(&state).await;
    notices.drain();

    let err = state.apply_coupon("nope").await.unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::NotFound(_))));

    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Coupon not found");
}

#[tokio::test]
async fn test_minimum_purchase_and_expiry() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, _) = woo.app_state();
    cart_of_two(&state).await;

    let err = state.apply_coupon("big500").await.unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::BelowMinimum(_))));
    assert_eq!(err.to_string(), "Coupon error: Minimum purchase: Rs. 10,000");

    let err = state.apply_coupon("summer2020").await.unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::Expired)));
}

#[tokio::test]
async fn test_blank_code_skips_lookup() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, _) = woo.app_state();

    let err = state.apply_coupon("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::EmptyCode)));
}
