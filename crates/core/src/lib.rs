//! Azlan Core - Shared types library.
//!
//! This crate provides common types used across all Azlan components:
//! - `storefront` - Catalog, cart, checkout and WooCommerce client library
//! - `cli` - Command-line front end for browsing and ordering
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
