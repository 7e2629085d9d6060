//! Order placement end to end: cart → payload → store → cleared cart.

#![allow(clippy::unwrap_used)]

use azlan_core::{PaymentMethod, ProductId};
use azlan_integration_tests::{Backend, FakeWoo, customer, product_json};
use azlan_storefront::checkout::{CheckoutError, CheckoutForm};
use azlan_storefront::woo::WooError;
use azlan_storefront::{AppError, AppState, NoticeLevel};
use serde_json::json;

fn form() -> CheckoutForm {
    CheckoutForm {
        name: "Ayesha Khan".to_string(),
        email: "ayesha@example.com".to_string(),
        address: "12 Mall Road".to_string(),
        city: "Lahore".to_string(),
        postal: "54000".to_string(),
        phone: "03001234567".to_string(),
        notes: "Please call before delivery".to_string(),
    }
}

async fn fill_cart(state: &AppState) {
    let shirt = state.woo().product(ProductId::new(1)).await.unwrap();
    let jacket = state.woo().product(ProductId::new(2)).await.unwrap();
    state.add_to_cart(&shirt, 2).await;
    state.add_to_cart(&jacket, 1).await;
}

fn backend() -> Backend {
    Backend::default().with_products(vec![
        product_json(1, "Linen Shirt", "2500", "", "Men"),
        product_json(2, "Denim Jacket", "4500", "3999", "Men"),
    ])
}

#[tokio::test]
async fn test_successful_order_clears_cart() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, notices) = woo.app_state();
    fill_cart(&state).await;
    notices.drain();

    let confirmation = state
        .place_order(form(), PaymentMethod::Cod, None, false)
        .await
        .unwrap();

    assert_eq!(confirmation.order_id.as_u64(), 5001);
    assert_eq!(confirmation.redirect, "/thank-you");
    assert!(state.with_cart(|c| c.is_empty()).await);

    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Order #5001 created successfully!");

    let order = woo.backend().orders[0].clone();
    assert_eq!(order["customer_id"], json!(0));
    assert_eq!(order["payment_method"], json!("cod"));
    assert_eq!(order["payment_method_title"], json!("Cash on Delivery"));
    assert_eq!(order["set_paid"], json!(false));
    assert_eq!(order["status"], json!("pending"));
    assert_eq!(
        order["line_items"],
        json!([
            { "product_id": 1, "quantity": 2 },
            { "product_id": 2, "quantity": 1 },
        ])
    );
    assert_eq!(order["shipping_lines"][0]["total"], json!("500"));
    assert_eq!(order["billing"]["first_name"], json!("Ayesha"));
    assert_eq!(order["billing"]["last_name"], json!("Khan"));
    assert_eq!(order["billing"]["email"], json!("ayesha@example.com"));
    assert_eq!(order["shipping"]["country"], json!("PK"));
    assert_eq!(order["customer_note"], json!("Please call before delivery"));
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let mut backend = backend();
    backend.fail_orders = true;
    let woo = FakeWoo::start(backend).await;
    let (state, _, notices) = woo.app_state();
    fill_cart(&state).await;
    notices.drain();

    let err = state
        .place_order(form(), PaymentMethod::Card, None, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::Order(WooError::Api { status: 400, ref message }))
            if message == "Invalid product ID."
    ));
    assert_eq!(state.with_cart(|c| c.count()).await, 3);

    let notices = notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to create order. Please try again.");
}

#[tokio::test]
async fn test_invalid_form_never_reaches_store() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, _) = woo.app_state();
    fill_cart(&state).await;

    let mut bad = form();
    bad.email = "not-an-email".to_string();
    let err = state
        .place_order(bad, PaymentMethod::Cod, None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::InvalidEmail(_))));
    assert!(woo.backend().orders.is_empty());
    assert!(!state.with_cart(|c| c.is_empty()).await);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, _) = woo.app_state();

    let err = state
        .place_order(form(), PaymentMethod::Cod, None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
    assert!(woo.backend().orders.is_empty());
}

#[tokio::test]
async fn test_stock_check_blocks_sold_out_lines() {
    let woo = FakeWoo::start(backend()).await;
    let (state, _, _) = woo.app_state();
    fill_cart(&state).await;

    // Sells out after it went into the cart
    woo.backend().products[1]["stock_status"] = json!("outofstock");

    let err = state
        .place_order(form(), PaymentMethod::Cod, None, true)
        .await
        .unwrap_err();

    match err {
        AppError::Checkout(CheckoutError::OutOfStock(errors)) => {
            assert_eq!(errors, ["Denim Jacket is out of stock"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(woo.backend().orders.is_empty());
    assert_eq!(state.with_cart(|c| c.count()).await, 3);
}

#[tokio::test]
async fn test_logged_in_order_carries_customer_id() {
    let woo = FakeWoo::start(backend().with_customer(customer(
        77,
        "sana@example.com",
        "correct horse",
        "Sana Malik",
    )))
    .await;
    let (state, _, _) = woo.app_state();
    state.login("sana@example.com", "correct horse").await.unwrap();
    fill_cart(&state).await;

    state
        .place_order(form(), PaymentMethod::Bacs, None, false)
        .await
        .unwrap();

    let orders = state
        .woo()
        .customer_orders(
            state.session().customer_id().unwrap(),
            state.session().token().unwrap().as_deref(),
        )
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].customer_id, 77);
    assert_eq!(orders[0].payment_method_title, "Direct Bank Transfer");
}
