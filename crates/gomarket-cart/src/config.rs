//! # Cart Configuration
//!
//! Where the cart is stored and how hard the writer tries to store it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GOMARKET_STORAGE_KEY=@GoMarketplace:cart                           │
//! │     GOMARKET_DB_PATH=/var/lib/gomarket/cart.db                         │
//! │     GOMARKET_MAX_RETRIES=5                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/gomarketplace/cart.toml (Linux)                          │
//! │     ~/Library/Application Support/com.gomarket.gomarketplace/cart.toml │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     key = "@GoMarketplace:cart", 3 retries, 100ms..5s backoff          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! [storage]
//! key = "@GoMarketplace:cart"
//! database_path = "/home/me/.local/share/gomarketplace/cart.db"
//!
//! [persistence]
//! max_retries = 3
//! initial_backoff_ms = 100
//! max_backoff_ms = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use gomarket_core::DEFAULT_STORAGE_KEY;

use crate::error::{CartError, CartResult};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "cart.toml";

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the cart payload lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Key the serialized cart is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// SQLite database file. `None` means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            key: default_storage_key(),
            database_path: None,
        }
    }
}

// =============================================================================
// Persistence Settings
// =============================================================================

/// Retry policy for failed cart writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Retries after the first failed write. 0 disables retrying.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on the delay between retries (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    100
}
fn default_max_backoff() -> u64 {
    5000
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        PersistenceSettings {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl PersistenceSettings {
    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Upper bound on the delay between retries.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Main Cart Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Storage location.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Write retry policy.
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

impl CartConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CartResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
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
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CartResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CartError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Cart config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CartResult<()> {
        if self.storage.key.trim().is_empty() {
            return Err(CartError::InvalidConfig("storage key must not be empty".into()));
        }

        if self.persistence.initial_backoff_ms == 0 {
            return Err(CartError::InvalidConfig(
                "initial_backoff_ms must be greater than 0".into(),
            ));
        }

        if self.persistence.initial_backoff_ms > self.persistence.max_backoff_ms {
            return Err(CartError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.persistence.initial_backoff_ms, self.persistence.max_backoff_ms
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("GOMARKET_STORAGE_KEY") {
            debug!(key = %key, "Overriding storage key from environment");
            self.storage.key = key;
        }

        if let Some(path) = var("GOMARKET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(retries) = var("GOMARKET_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.persistence.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid GOMARKET_MAX_RETRIES"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gomarket", "gomarketplace")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the storage key.
    pub fn storage_key(&self) -> &str {
        &self.storage.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gomarket-config-{}-{}", std::process::id(), name))
            .join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();

        assert_eq!(config.storage_key(), "@GoMarketplace:cart");
        assert_eq!(config.storage.database_path, None);
        assert_eq!(config.persistence.max_retries, 3);
        assert_eq!(config.persistence.initial_backoff(), Duration::from_millis(100));
        assert_eq!(config.persistence.max_backoff(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CartConfig::default();

        config.storage.key = "   ".to_string();
        assert!(matches!(config.validate(), Err(CartError::InvalidConfig(_))));

        config.storage.key = "cart".to_string();
        config.persistence.initial_backoff_ms = 10_000;
        assert!(config.validate().is_err());

        config.persistence.initial_backoff_ms = 0;
        assert!(config.validate().is_err());

        config.persistence.initial_backoff_ms = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CartConfig = toml::from_str(
            r#"
            [persistence]
            max_retries = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.persistence.max_retries, 7);
        assert_eq!(config.persistence.initial_backoff_ms, 100);
        assert_eq!(config.storage_key(), DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GOMARKET_STORAGE_KEY", "@Other:cart"),
            ("GOMARKET_DB_PATH", "/tmp/cart.db"),
            ("GOMARKET_MAX_RETRIES", "9"),
        ]
        .into_iter()
        .collect();

        let mut config = CartConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage_key(), "@Other:cart");
        assert_eq!(config.storage.database_path, Some(PathBuf::from("/tmp/cart.db")));
        assert_eq!(config.persistence.max_retries, 9);
    }

    #[test]
    fn test_invalid_env_retries_ignored() {
        let mut config = CartConfig::default();
        config.apply_overrides(|name| {
            (name == "GOMARKET_MAX_RETRIES").then(|| "lots".to_string())
        });

        assert_eq!(config.persistence.max_retries, 3);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_config_path("roundtrip");
        let mut config = CartConfig::default();
        config.persistence.max_retries = 5;
        config.storage.database_path = Some(PathBuf::from("/data/cart.db"));

        let written = config.save(Some(path.clone())).unwrap();
        let loaded = CartConfig::load(Some(written)).unwrap();

        assert_eq!(loaded.persistence.max_retries, 5);
        assert_eq!(loaded.storage.database_path, Some(PathBuf::from("/data/cart.db")));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let path = temp_config_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[storage\nkey = ").unwrap();

        let err = CartConfig::load(Some(path.clone())).unwrap_err();
        assert!(matches!(err, CartError::ConfigLoadFailed(_)));

        let fallback = CartConfig::load_or_default(Some(path.clone()));
        assert_eq!(fallback.persistence.max_retries, 3);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&CartConfig::default()).unwrap();

        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[persistence]"));
        assert!(!toml_str.contains("database_path"));
    }
}
