//! Coupon lookup and order placement.

use azlan_core::PaymentMethod;
use azlan_storefront::checkout::CheckoutForm;
use azlan_storefront::{AppError, AppState};
use clap::Args;

use crate::output;

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Full name; the first word is the first name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub city: String,

    /// Postal code
    #[arg(long)]
    pub postal: String,

    #[arg(long)]
    pub phone: String,

    /// Note to the store
    #[arg(long, default_value = "")]
    pub notes: String,

    /// `cod`, `card`, `bacs` or `easypaisa`
    #[arg(long, default_value = "cod")]
    pub payment: PaymentMethod,

    /// Coupon code to apply
    #[arg(long)]
    pub coupon: Option<String>,

    /// Re-check stock with the store before ordering
    #[arg(long)]
    pub check_stock: bool,
}

impl CheckoutArgs {
    fn form(&self) -> CheckoutForm {
        CheckoutForm {
            name: self.name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal: self.postal.clone(),
            phone: self.phone.clone(),
            notes: self.notes.clone(),
        }
    }
}

pub async fn coupon(state: &AppState, code: &str) -> Result<(), AppError> {
    let applied = state.apply_coupon(code).await?;
    output::summary(&state.totals(Some(&applied)).await);
    Ok(())
}

pub async fn checkout(state: &AppState, args: CheckoutArgs) -> Result<(), AppError> {
    let coupon = match args.coupon.as_deref() {
        Some(code) => Some(state.apply_coupon(code).await?),
        None => None,
    };
    output::summary(&state.totals(coupon.as_ref()).await);

    let confirmation = state
        .place_order(args.form(), args.payment, coupon, args.check_stock)
        .await?;
    output::line(format!(
        "Order #{} placed. Confirmation page: {}",
        confirmation.order_id, confirmation.redirect
    ));
    Ok(())
}
