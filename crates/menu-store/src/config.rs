//! # Client Configuration
//!
//! Cache lifetimes and cart settings for the menu client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MENU_CACHE_TTL_SECS=600                                            │
//! │     MENU_TAX_RATE_BPS=800                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/menu-client/client.toml (Linux)                          │
//! │     ~/Library/Application Support/com.menu.menu-client/client.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 min TTL, 2.5 min for high-churn resources, 16% tax               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [cache]
//! default_ttl_secs = 300
//! high_churn_ttl_secs = 150
//!
//! [cart]
//! tax_rate_bps = 1600
//! notification_delay_ms = 3000
//! storage_key = "shopping-cart"
//! max_lines = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use menu_core::validation::validate_tax_rate_bps;
use menu_core::{TaxRate, DEFAULT_TAX_RATE_BPS, MAX_CART_LINES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::resource::ResourceKind;

// =============================================================================
// Cache Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// TTL for restaurants and categories (seconds).
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,

    /// TTL for dishes, hero slides and favorites (seconds).
    #[serde(default = "default_high_churn_ttl")]
    pub high_churn_ttl_secs: u64,
}

fn default_ttl() -> u64 {
    300
}

fn default_high_churn_ttl() -> u64 {
    150
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            default_ttl_secs: default_ttl(),
            high_churn_ttl_secs: default_high_churn_ttl(),
        }
    }
}

// =============================================================================
// Cart Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSettings {
    /// Tax rate in basis points.
    #[serde(default = "default_tax_rate")]
    pub tax_rate_bps: u32,

    /// How long the "item added" notification stays up (milliseconds).
    #[serde(default = "default_notification_delay")]
    pub notification_delay_ms: u64,

    /// Persistence key of the cart snapshot.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Maximum distinct lines in the cart.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_tax_rate() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_notification_delay() -> u64 {
    3000
}

fn default_storage_key() -> String {
    "shopping-cart".to_string()
}

fn default_max_lines() -> usize {
    MAX_CART_LINES
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            tax_rate_bps: default_tax_rate(),
            notification_delay_ms: default_notification_delay(),
            storage_key: default_storage_key(),
            max_lines: default_max_lines(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub cart: CartSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| StoreError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.cache.default_ttl_secs == 0 || self.cache.high_churn_ttl_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "cache TTLs must be greater than 0".into(),
            ));
        }

        validate_tax_rate_bps(self.cart.tax_rate_bps)
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        if self.cart.storage_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "cart storage_key must not be empty".into(),
            ));
        }

        if self.cart.max_lines == 0 || self.cart.max_lines > MAX_CART_LINES {
            return Err(StoreError::InvalidConfig(format!(
                "cart max_lines must be between 1 and {MAX_CART_LINES}"
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(secs) = env_parse::<u64>("MENU_CACHE_TTL_SECS") {
            debug!(secs, "Overriding default TTL from environment");
            self.cache.default_ttl_secs = secs;
        }

        if let Some(secs) = env_parse::<u64>("MENU_HIGH_CHURN_TTL_SECS") {
            debug!(secs, "Overriding high-churn TTL from environment");
            self.cache.high_churn_ttl_secs = secs;
        }

        if let Some(bps) = env_parse::<u32>("MENU_TAX_RATE_BPS") {
            debug!(bps, "Overriding tax rate from environment");
            self.cart.tax_rate_bps = bps;
        }

        if let Some(ms) = env_parse::<u64>("MENU_NOTIFICATION_DELAY_MS") {
            self.cart.notification_delay_ms = ms;
        }

        if let Ok(key) = std::env::var("MENU_CART_STORAGE_KEY") {
            self.cart.storage_key = key;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "menu", "menu-client")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Cache lifetime for a resource.
    pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
        if kind.is_high_churn() {
            Duration::from_secs(self.cache.high_churn_ttl_secs)
        } else {
            Duration::from_secs(self.cache.default_ttl_secs)
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.cart.tax_rate_bps)
    }

    pub fn notification_delay(&self) -> Duration {
        Duration::from_millis(self.cart.notification_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
