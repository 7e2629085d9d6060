//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WOO_CONSUMER_KEY` - WooCommerce REST API consumer key
//! - `WOO_CONSUMER_SECRET` - WooCommerce REST API consumer secret
//!
//! ## Optional
//! - `WOO_API_BASE_URL` - REST base (default: `https://dp.ambalatea.com/wp-json/wc/v3`)
//! - `WOO_JWT_AUTH_URL` - JWT auth base (default: `https://dp.ambalatea.com/wp-json/jwt-auth/v1`)
//! - `PRODUCT_FEED_URL` - Secondary JSON product feed (default: `https://cocobee.com.pk/products.json`)
//! - `AZLAN_DATA_DIR` - Directory for the persisted cart and session (default: `.azlan`)
//! - `AZLAN_SHIPPING_FEE` - Flat shipping fee added to orders (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const DEFAULT_WOO_BASE_URL: &str = "https://dp.ambalatea.com/wp-json/wc/v3";
pub const DEFAULT_JWT_AUTH_URL: &str = "https://dp.ambalatea.com/wp-json/jwt-auth/v1";
pub const DEFAULT_FEED_URL: &str = "https://cocobee.com.pk/products.json";
pub const DEFAULT_DATA_DIR: &str = ".azlan";
pub const DEFAULT_SHIPPING_FEE: &str = "500";

/// Sent on every backend request; some WordPress hosts reject unknown agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// WooCommerce REST API configuration
    pub woo: WooConfig,
    /// Secondary Shopify-style product feed
    pub feed_url: String,
    /// Directory holding persisted key-value state (cart, auth token)
    pub data_dir: PathBuf,
    /// Flat shipping fee added to each order
    pub shipping_fee: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// WooCommerce REST API configuration.
///
/// Implements `Debug` manually to redact the consumer secret.
#[derive(Clone)]
pub struct WooConfig {
    /// REST base URL without trailing slash (e.g. `https://host/wp-json/wc/v3`)
    pub base_url: String,
    /// JWT auth base URL without trailing slash
    pub jwt_url: String,
    /// Consumer key (basic auth username)
    pub consumer_key: String,
    /// Consumer secret (basic auth password)
    pub consumer_secret: SecretString,
    /// User-Agent header value
    pub user_agent: String,
}

impl std::fmt::Debug for WooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooConfig")
            .field("base_url", &self.base_url)
            .field("jwt_url", &self.jwt_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl WooConfig {
    /// Build a config pointing at `base_url`, with the JWT endpoint derived
    /// from the same WordPress host.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        consumer_key: impl Into<String>,
        consumer_secret: SecretString,
    ) -> Result<Self, ConfigError> {
        let base_url = validate_url("WOO_API_BASE_URL", base_url)?;
        let jwt_url = derive_jwt_url(&base_url);
        Ok(Self {
            base_url,
            jwt_url,
            consumer_key: consumer_key.into(),
            consumer_secret,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = validate_url(
            "WOO_API_BASE_URL",
            &get_env_or_default("WOO_API_BASE_URL", DEFAULT_WOO_BASE_URL),
        )?;
        let jwt_url = validate_url(
            "WOO_JWT_AUTH_URL",
            &get_env_or_default("WOO_JWT_AUTH_URL", DEFAULT_JWT_AUTH_URL),
        )?;
        let consumer_key = get_required_env("WOO_CONSUMER_KEY")?;
        validate_secret_strength(&consumer_key, "WOO_CONSUMER_KEY")?;

        Ok(Self {
            base_url,
            jwt_url,
            consumer_key,
            consumer_secret: get_validated_secret("WOO_CONSUMER_SECRET")?,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API credentials look like placeholders.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let woo = WooConfig::from_env()?;
        let feed_url = validate_url(
            "PRODUCT_FEED_URL",
            &get_env_or_default("PRODUCT_FEED_URL", DEFAULT_FEED_URL),
        )?;
        let data_dir = PathBuf::from(get_env_or_default("AZLAN_DATA_DIR", DEFAULT_DATA_DIR));
        let shipping_fee = get_env_or_default("AZLAN_SHIPPING_FEE", DEFAULT_SHIPPING_FEE)
            .parse::<Decimal>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AZLAN_SHIPPING_FEE".to_string(), e.to_string())
            })?;
        if shipping_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "AZLAN_SHIPPING_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            woo,
            feed_url,
            data_dir,
            shipping_fee,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Check that `value` parses as an absolute http(s) URL and strip any trailing slash.
fn validate_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// `https://host/wp-json/wc/v3` -> `https://host/wp-json/jwt-auth/v1`
fn derive_jwt_url(base_url: &str) -> String {
    base_url.split_once("/wp-json/").map_or_else(
        || format!("{base_url}/jwt-auth/v1"),
        |(site, _)| format!("{site}/wp-json/jwt-auth/v1"),
    )
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder-looking or low-entropy API credentials.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from WooCommerce > Settings > Advanced > REST API."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_real_looking_woo_keys_pass() {
        assert!(
            validate_secret_strength("ck_3f9a1c7e5b2d8406fa91e3c7b5d20a8e6f4c1b93", "K").is_ok()
        );
        assert!(
            validate_secret_strength("cs_8e2b0f4d6a1c9e7b3d5f0a2c4e6b8d1f3a5c7e90", "S").is_ok()
        );
    }

    #[test]
    fn test_placeholder_keys_rejected() {
        let err = validate_secret_strength("your-consumer-key", "WOO_CONSUMER_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("ck_xxxxxxxxxxxxxxxx", "K").is_err());
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "K").is_err());
    }

    #[test]
    fn test_validate_url_strips_trailing_slash() {
        assert_eq!(
            validate_url("X", "https://shop.pk/wp-json/wc/v3/").unwrap(),
            "https://shop.pk/wp-json/wc/v3"
        );
        assert!(validate_url("X", "not a url").is_err());
        assert!(validate_url("X", "ftp://shop.pk").is_err());
    }

    #[test]
    fn test_derive_jwt_url() {
        assert_eq!(
            derive_jwt_url("https://shop.pk/wp-json/wc/v3"),
            "https://shop.pk/wp-json/jwt-auth/v1"
        );
        assert_eq!(
            derive_jwt_url("http://127.0.0.1:4000"),
            "http://127.0.0.1:4000/jwt-auth/v1"
        );
    }

    #[test]
    fn test_woo_config_debug_redacts_secret() {
        let config = WooConfig::new(
            "https://shop.pk/wp-json/wc/v3",
            "ck_public_part",
            SecretString::from("cs_super_private_value"),
        )
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("ck_public_part"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cs_super_private_value"));
    }
}
