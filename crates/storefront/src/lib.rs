//! Azlan storefront library.
//!
//! Catalog browsing, cart, checkout and customer session for a WooCommerce
//! store, independent of any particular front end.
//!
//! # Modules
//!
//! - [`woo`] - WooCommerce REST client (products, orders, customers, coupons)
//! - [`feed`] - Secondary product feed (featured, new arrivals, trending)
//! - [`catalog`] - Search, filter, sort and pagination over loaded products
//! - [`cart`] - Persisted shopping cart
//! - [`checkout`] - Order validation, payload assembly and submission
//! - [`state`] - [`AppState`], the object front ends hold

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod error;
pub mod feed;
pub mod notify;
pub mod search;
pub mod session;
pub mod state;
pub mod storage;
pub mod woo;

pub use cart::{Cart, CartEntry};
pub use config::StorefrontConfig;
pub use error::AppError;
pub use notify::{Notice, NoticeLevel, Notifier};
pub use state::AppState;
