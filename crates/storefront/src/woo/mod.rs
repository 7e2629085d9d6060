//! WooCommerce REST API client.
//!
//! # Architecture
//!
//! - WooCommerce is the source of truth: no local sync, direct REST calls
//! - Store-level calls authenticate with the consumer key/secret (basic auth)
//! - Customer-scoped calls carry the customer's JWT as a bearer token
//! - Product lists, single products and categories are cached in memory via
//!   `moka` (5 minute TTL); product mutations invalidate the cache
//!
//! # Example
//!
//! ```rust,ignore
//! use azlan_storefront::woo::WooClient;
//!
//! let client = WooClient::new(&config.woo)?;
//! let products = client.products().await?;
//! let token = client.login("ayesha@example.com", "hunter2").await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::{Auth, WooClient};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to WooCommerce.
#[derive(Debug, Error)]
pub enum WooError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WooCommerce answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the JSON shape we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A customer-scoped call was made without a token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Rate limited by the store.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl WooError {
    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NotFound(_) => Some(404),
            Self::NotAuthenticated => Some(401),
            Self::RateLimited(_) => Some(429),
            Self::Parse(_) => None,
        }
    }

    /// Whether the error came from the store rejecting the request rather
    /// than from transport or parsing.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woo_error_display() {
        let err = WooError::NotFound("coupon SAVE10".to_string());
        assert_eq!(err.to_string(), "Not found: coupon SAVE10");

        let err = WooError::Api {
            status: 400,
            message: "Invalid ID.".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - Invalid ID.");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = WooError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
        assert_eq!(err.status(), Some(429));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        let err = WooError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(!err.is_client_error());
    }
}
