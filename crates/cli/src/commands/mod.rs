//! Subcommand implementations.

pub mod account;
pub mod admin;
pub mod browse;
pub mod cart;
pub mod checkout;
