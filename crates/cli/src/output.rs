//! Terminal rendering. Everything the CLI prints goes through here.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use azlan_core::Price;
use azlan_storefront::catalog::{Page, Product};
use azlan_storefront::checkout::OrderTotals;
use azlan_storefront::feed::FeedProduct;
use azlan_storefront::woo::{Category, Customer, Order, Review};
use azlan_storefront::{AppError, CartEntry, Notice, NoticeLevel};
use rust_decimal::Decimal;

fn money(amount: Decimal) -> String {
    Price::pkr(amount).display()
}

pub fn notices(notices: &[Notice]) {
    for notice in notices {
        let marker = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "i",
            NoticeLevel::Error => "✗",
        };
        println!("{marker} {}", notice.message);
    }
}

pub fn failure(error: &AppError) {
    eprintln!("error: {error}");
}

pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

fn product_row(product: &Product) -> String {
    let price = if product.is_on_sale() {
        format!(
            "{} (was {})",
            money(product.effective_price()),
            money(product.price)
        )
    } else {
        money(product.effective_price())
    };
    format!(
        "{:>6}  {:<40}  {:<24}  {}",
        product.id,
        product.name,
        price,
        product.stock_status.as_str()
    )
}

pub fn product_page(page: &Page<Product>) {
    if page.items.is_empty() {
        println!("No products found.");
        return;
    }
    for product in &page.items {
        println!("{}", product_row(product));
    }
    println!(
        "\nShowing {}-{} of {} products (page {}/{})",
        page.first_index(),
        page.last_index(),
        page.total_items,
        page.number,
        page.total_pages.max(1)
    );
}

pub fn product_detail(product: &Product) {
    println!("{} (#{})", product.name, product.id);
    println!("  Price:    {}", money(product.effective_price()));
    if product.is_on_sale() {
        println!(
            "  Was:      {} ({}% off)",
            money(product.price),
            azlan_core::discount_percentage(product.effective_price(), Some(product.price))
        );
    }
    println!("  Stock:    {}", product.stock_status.as_str());
    if let Some(quantity) = product.stock_quantity {
        println!("  In stock: {quantity}");
    }
    if !product.categories.is_empty() {
        let names: Vec<&str> = product.categories.iter().map(|c| c.name.as_str()).collect();
        println!("  Category: {}", names.join(", "));
    }
    if let Some(image) = product.primary_image() {
        println!("  Image:    {}", image.src);
    }
}

pub fn categories(categories: &[Category]) {
    for category in categories {
        println!("{:<24}  {:>4} products", category.name, category.count);
    }
}

pub fn feed_products(products: &[FeedProduct]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        println!("{}", product_row(&product.to_product()));
    }
}

pub fn cart(entries: &[CartEntry], totals: &OrderTotals) {
    if entries.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for entry in entries {
        println!(
            "{:>6}  {:<40}  {:>3} x {:<12}  {}",
            entry.id(),
            entry.product.name,
            entry.quantity,
            money(entry.product.effective_price()),
            money(entry.line_total())
        );
    }
    summary(totals);
}

pub fn summary(totals: &OrderTotals) {
    println!("\n  Subtotal:  {}", money(totals.subtotal));
    println!("  Shipping:  {}", money(totals.shipping));
    println!("  Tax:       {}", money(totals.tax));
    if totals.discount > Decimal::ZERO {
        println!("  Discount: -{}", money(totals.discount));
    }
    println!("  Total:     {}", money(totals.total));
}

pub fn customer(customer: &Customer) {
    println!("{} <{}> (#{})", customer.display_name(), customer.email, customer.id);
    let billing = &customer.billing;
    if !billing.address_1.is_empty() {
        println!("  {}, {} {}", billing.address_1, billing.city, billing.postcode);
    }
    if let Some(phone) = billing.phone.as_deref().filter(|p| !p.is_empty()) {
        println!("  {phone}");
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let date = order
            .date_created
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "#{:<8} {:<10}  {:<12}  {:>12}  {} item(s)",
            order.number,
            date,
            order.status,
            money(order.total),
            order.line_items.iter().map(|l| u64::from(l.quantity)).sum::<u64>()
        );
    }
}

pub fn reviews(reviews: &[Review]) {
    if reviews.is_empty() {
        println!("No reviews yet.");
        return;
    }
    for review in reviews {
        let stars = "★".repeat(usize::from(review.rating.min(5)));
        let verified = if review.verified { " (verified)" } else { "" };
        println!("{stars:<5}  {}{verified}", review.reviewer);
        println!("       {}", strip_tags(&review.review));
    }
}

/// Drop HTML tags from a review body.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Great fabric!</p>\n"), "Great fabric!");
        assert_eq!(strip_tags("plain"), "plain");
    }
}
