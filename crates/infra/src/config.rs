//! Configuration loading and representation.
//!
//! Everything comes from environment variables; relay settings stay optional
//! until checkout actually needs them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_CART_KEY: &str = "headless_store_cart";
pub const DEFAULT_CURRENCY: &str = "ILS";
pub const DEFAULT_BILLING_COUNTRY: &str = "IL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage backend `{0}` (expected file, sqlite or memory)")]
    UnknownStorage(String),

    #[error("no platform data directory; set STOREFRONT_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownStorage(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        })
    }
}

/// WooCommerce REST credentials; any of them may be missing until checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WooCommerceSettings {
    /// WordPress site URL without trailing slash.
    pub site_url: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub billing_country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub cart_key: String,
    pub currency: String,
    pub woocommerce: WooCommerceSettings,
}

/// Non-blank, trimmed value.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_blank(lookup(name));

        let storage = match var("STOREFRONT_STORAGE") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::default(),
        };

        let data_dir = match var("STOREFRONT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join("storefront"))
                .ok_or(ConfigError::NoDataDir)?,
        };

        let woocommerce = WooCommerceSettings {
            site_url: var("WORDPRESS_SITE_URL").map(|url| url.trim_end_matches('/').to_string()),
            consumer_key: var("WOOCOMMERCE_CONSUMER_KEY"),
            consumer_secret: var("WOOCOMMERCE_CONSUMER_SECRET"),
            billing_country: var("STOREFRONT_BILLING_COUNTRY")
                .unwrap_or_else(|| DEFAULT_BILLING_COUNTRY.to_string()),
        };

        Ok(Self {
            storage,
            data_dir,
            cart_key: var("STOREFRONT_CART_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string()),
            currency: var("STOREFRONT_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            woocommerce,
        })
    }
}
