//! Unified error handling with Sentry integration.
//!
//! Every storefront operation has its own error type; `AppError` collects
//! them for callers that drive several operations (the CLI, the app state)
//! and reports the ones worth alerting on to Sentry.

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::coupon::CouponError;
use crate::feed::FeedError;
use crate::session::SessionError;
use crate::storage::StorageError;
use crate::woo::WooError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("WooCommerce error: {0}")]
    Woo(#[from] WooError),

    #[error("Product feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error points at a fault on our side or upstream rather
    /// than at something the shopper did.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Feed(_) => true,
            Self::Woo(e) | Self::Checkout(CheckoutError::Order(e)) => !e.is_client_error(),
            Self::Session(SessionError::Storage(_)) => true,
            Self::Coupon(CouponError::Woo(e)) | Self::Session(SessionError::Login(e)) => {
                !e.is_client_error()
            }
            _ => false,
        }
    }

    /// Report server-side errors to Sentry and log them. Shopper mistakes
    /// are only logged at debug level.
    pub fn capture(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::from(CouponError::Expired);
        assert_eq!(err.to_string(), "Coupon error: Coupon has expired");
    }

    #[test]
    fn test_server_error_classification() {
        assert!(!AppError::from(CheckoutError::EmptyCart).is_server_error());
        assert!(!AppError::from(WooError::NotAuthenticated).is_server_error());
        assert!(!AppError::from(WooError::RateLimited(5)).is_server_error());
        assert!(
            AppError::from(WooError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })
            .is_server_error()
        );
        assert!(AppError::from(FeedError::Status(500)).is_server_error());
        assert!(!AppError::BadRequest("quantity".to_string()).is_server_error());
    }
}
