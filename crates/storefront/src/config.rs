//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `MERCHANT_API_URL` - Merchant backend base URL
//!   (default: <https://navdana-backend-2.onrender.com/api/v1>)
//! - `STORE_NAME` - Name shown in the header and payment widget (default: Navdana Store)
//! - `PAYMENT_WIDGET_URL` - Gateway checkout script
//!   (default: <https://checkout.razorpay.com/v1/checkout.js>)
//! - `PAYMENT_GATEWAY_ORIGINS` - Space-separated origins allowed by the CSP for the gateway
//! - `PAYMENT_WIDGET_PIN_INTEGRITY` - Pin the widget script with an SRI digest (default: true)
//! - `PAYMENT_THEME_COLOR` - Widget accent color (default: #000000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::Url;

/// Default merchant backend base URL.
pub const DEFAULT_MERCHANT_API_URL: &str = "https://navdana-backend-2.onrender.com/api/v1";

/// Default gateway checkout script.
pub const DEFAULT_WIDGET_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";

const DEFAULT_GATEWAY_ORIGINS: &str = "https://checkout.razorpay.com https://api.razorpay.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Store name shown in the header and passed to the payment widget
    pub store_name: String,
    /// Merchant backend configuration
    pub merchant: MerchantConfig,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Merchant backend configuration.
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    /// Base URL, without a trailing slash
    pub api_url: String,
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// URL of the gateway's checkout script
    pub widget_url: String,
    /// Origins the gateway loads scripts, frames and XHR from
    pub gateway_origins: Vec<String>,
    /// Whether the script tag carries an `integrity` attribute
    pub pin_integrity: bool,
    /// Widget accent color
    pub theme_color: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_url("STOREFRONT_BASE_URL", None)?;
        let store_name = get_env_or_default("STORE_NAME", "Navdana Store");

        Ok(Self {
            host,
            port,
            base_url,
            store_name,
            merchant: MerchantConfig::from_env()?,
            payment: PaymentConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl MerchantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_url("MERCHANT_API_URL", Some(DEFAULT_MERCHANT_API_URL))?,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let pin_integrity = match get_env_or_default("PAYMENT_WIDGET_PIN_INTEGRITY", "true")
            .to_ascii_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "PAYMENT_WIDGET_PIN_INTEGRITY".to_string(),
                    format!("expected a boolean, got '{other}'"),
                ));
            }
        };

        Ok(Self {
            widget_url: get_url("PAYMENT_WIDGET_URL", Some(DEFAULT_WIDGET_URL))?,
            gateway_origins: parse_origins(&get_env_or_default(
                "PAYMENT_GATEWAY_ORIGINS",
                DEFAULT_GATEWAY_ORIGINS,
            )),
            pin_integrity,
            theme_color: get_env_or_default("PAYMENT_THEME_COLOR", "#000000"),
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an absolute http(s) URL, trimmed of any trailing slash.
fn get_url(key: &str, default: Option<&str>) -> Result<String, ConfigError> {
    let raw = match default {
        Some(default) => get_env_or_default(key, default),
        None => get_required_env(key)?,
    };
    validate_url(key, &raw)
}

fn validate_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Split a whitespace- or comma-separated origin list.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}
