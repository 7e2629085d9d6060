//! Defensive coercion of raw backend product records.
//!
//! WooCommerce returns prices as strings (`"1000"`, or `""` for "no sale
//! price"), sometimes omits arrays entirely, and third-party plugins add
//! surprises. Everything downstream assumes well-typed [`Product`]s, so raw
//! JSON is coerced here once instead of being checked at every filter.

use std::str::FromStr;

use azlan_core::{ProductId, StockStatus};
use rust_decimal::Decimal;
use serde_json::Value;

use super::product::{CategoryRef, Product, ProductImage};

/// Normalize every record in a JSON array. Non-arrays produce an empty list.
#[must_use]
pub fn normalize_products(raw: &Value) -> Vec<Product> {
    raw.as_array()
        .map(|items| items.iter().filter_map(normalize_product).collect())
        .unwrap_or_default()
}

/// Coerce a single raw record into a [`Product`].
///
/// Returns `None` only when the record has no usable id; every other field
/// falls back to a neutral default.
#[must_use]
pub fn normalize_product(raw: &Value) -> Option<Product> {
    let Some(id) = raw.get("id").and_then(coerce_id) else {
        tracing::warn!(record = %truncate(raw), "skipping product without a usable id");
        return None;
    };

    Some(Product {
        id: ProductId::new(id),
        name: raw.get("name").map(coerce_string).unwrap_or_default(),
        price: raw
            .get("price")
            .and_then(coerce_decimal)
            .unwrap_or(Decimal::ZERO),
        sale_price: raw.get("sale_price").and_then(coerce_decimal),
        stock_status: raw
            .get("stock_status")
            .map(coerce_string)
            .map_or(StockStatus::Other(String::new()), StockStatus::from),
        stock_quantity: raw.get("stock_quantity").and_then(Value::as_i64),
        categories: array_of(raw, "categories")
            .filter_map(|c| {
                c.get("name")
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .map(|name| CategoryRef {
                        name: name.to_string(),
                    })
            })
            .collect(),
        images: array_of(raw, "images")
            .filter_map(|i| {
                i.get("src")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(|src| ProductImage {
                        src: src.to_string(),
                        alt: i
                            .get("alt")
                            .and_then(Value::as_str)
                            .filter(|a| !a.is_empty())
                            .map(str::to_string),
                    })
            })
            .collect(),
        handle: raw
            .get("slug")
            .or_else(|| raw.get("handle"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn array_of<'a>(raw: &'a Value, field: &str) -> impl Iterator<Item = &'a Value> {
    raw.get(field)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

fn coerce_id(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings pass through, numbers and booleans are stringified, null is empty.
fn coerce_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Numbers and numeric strings become decimals; null, blank and garbage become `None`.
pub(crate) fn coerce_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Decimal::from_str(s).ok()
            }
        }
        _ => None,
    }
}

fn truncate(v: &Value) -> String {
    v.to_string().chars().take(120).collect()
}
