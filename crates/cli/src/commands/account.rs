//! Login, profile, order history and reviews.

use azlan_core::ProductId;
use azlan_storefront::woo::{NewReview, WooError};
use azlan_storefront::{AppError, AppState, Notice};
use clap::Args;

use crate::output;

#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Product id
    pub id: u64,

    /// Stars, 1 to 5
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,

    /// Review text
    #[arg(short, long)]
    pub text: String,

    /// Reviewer name (defaults to the logged-in customer)
    #[arg(long)]
    pub name: Option<String>,

    /// Reviewer email (defaults to the logged-in customer)
    #[arg(long)]
    pub email: Option<String>,
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    state.login(email, password).await?;
    Ok(())
}

pub fn logout(state: &AppState) -> Result<(), AppError> {
    state.logout()?;
    state.notifier().notify(Notice::info("Logged out"));
    Ok(())
}

pub async fn whoami(state: &AppState) -> Result<(), AppError> {
    let token = state.session().token()?;
    if token.is_none() {
        output::line("Not logged in.");
        return Ok(());
    }
    let customer = state.woo().customer_profile(token.as_deref()).await?;
    output::customer(&customer);
    Ok(())
}

pub async fn orders(state: &AppState) -> Result<(), AppError> {
    let token = state.session().token()?;
    let customer_id = state
        .session()
        .customer_id()
        .ok_or(WooError::NotAuthenticated)?;
    let orders = state
        .woo()
        .customer_orders(customer_id, token.as_deref())
        .await?;
    output::orders(&orders);
    Ok(())
}

pub async fn reviews(state: &AppState, id: u64) -> Result<(), AppError> {
    let reviews = state.woo().product_reviews(ProductId::new(id)).await?;
    output::reviews(&reviews);
    Ok(())
}

pub async fn review(state: &AppState, args: ReviewArgs) -> Result<(), AppError> {
    let token = state.session().token()?;
    let user = state.session().current_user()?;

    let reviewer = args
        .name
        .or_else(|| user.as_ref().map(|u| u.display_name.clone()))
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("--name is required when logged out".to_string()))?;
    let reviewer_email = args
        .email
        .or_else(|| user.as_ref().map(|u| u.email.clone()))
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("--email is required when logged out".to_string()))?;

    let review = NewReview {
        product_id: ProductId::new(args.id),
        review: args.text,
        reviewer,
        reviewer_email,
        rating: args.rating,
    };
    state.woo().create_review(&review, token.as_deref()).await?;
    state
        .notifier()
        .notify(Notice::success("Thanks for your review!"));
    Ok(())
}
