//! Store administration commands.
//!
//! These use the consumer key/secret from the environment, so they act with
//! the store's full REST permissions.
//!
//! # Usage
//!
//! ```bash
//! azlan admin order-status 1042 completed
//! azlan admin delete-order 1042
//! azlan admin delete-product 412
//! ```

use azlan_core::{OrderId, OrderStatus, ProductId};
use azlan_storefront::{AppError, AppState, Notice};

pub async fn order_status(state: &AppState, id: u64, status: &str) -> Result<(), AppError> {
    let status: OrderStatus = status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid order status: {status}")))?;

    let order = state
        .woo()
        .update_order_status(OrderId::new(id), status)
        .await?;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
    state.notifier().notify(Notice::success(format!(
        "Order #{} is now {}",
        order.id, order.status
    )));
    Ok(())
}

pub async fn delete_order(state: &AppState, id: u64) -> Result<(), AppError> {
    state.woo().delete_order(OrderId::new(id)).await?;
    state
        .notifier()
        .notify(Notice::success(format!("Order #{id} deleted")));
    Ok(())
}

pub async fn delete_product(state: &AppState, id: u64) -> Result<(), AppError> {
    state.woo().delete_product(ProductId::new(id)).await?;
    state
        .notifier()
        .notify(Notice::success(format!("Product #{id} deleted")));
    Ok(())
}
