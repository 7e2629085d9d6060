//! Cart commands. The cart lives in the data directory between runs.

use azlan_core::ProductId;
use azlan_storefront::{AppError, AppState, Notice};

use crate::output;

pub async fn show(state: &AppState) {
    let totals = state.totals(None).await;
    let entries = state.with_cart(|cart| cart.entries().to_vec()).await;
    output::cart(&entries, &totals);
}

pub async fn add(state: &AppState, id: u64, quantity: u32) -> Result<(), AppError> {
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }
    let product = state.woo().product(ProductId::new(id)).await?;
    if !product.stock_status.is_in_stock() {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }
    state.add_to_cart(&product, quantity).await;
    Ok(())
}

pub async fn remove(state: &AppState, id: u64) {
    let id = ProductId::new(id);
    let removed = state
        .with_cart(|cart| {
            let present = cart.contains(id);
            cart.remove(id);
            present
        })
        .await;
    if removed {
        state.notifier().notify(Notice::info("Removed from cart"));
    }
}

pub async fn update(state: &AppState, id: u64, quantity: u32) -> Result<(), AppError> {
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1 (use `cart remove` instead)".to_string(),
        ));
    }
    let id = ProductId::new(id);
    let updated = state
        .with_cart(|cart| {
            cart.update_quantity(id, quantity);
            cart.contains(id)
        })
        .await;
    if updated {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("product {id} is not in the cart")))
    }
}

pub async fn clear(state: &AppState) {
    state.with_cart(azlan_storefront::Cart::clear).await;
    state.notifier().notify(Notice::info("Cart cleared"));
}
