use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::types::DEFAULT_KDF_ITERATIONS;
use crate::error::AccountsError;
use crate::storage::LOCAL_STORAGE_KEY;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AccountsConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub persist: PersistConfig,
    #[serde(default)]
    pub crypto: CryptoConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub path: String,
    #[serde(default = "default_storage_key")]
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersistConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CryptoConfig {
    pub kdf_iterations: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_key() -> String {
    LOCAL_STORAGE_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/accounts".to_string(),
            key: default_storage_key(),
        }
    }
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            storage: StorageConfig::default(),
            persist: PersistConfig::default(),
            crypto: CryptoConfig::default(),
        }
    }
}

impl AccountsConfig {
    pub fn from_toml(s: &str) -> Result<Self, AccountsError> {
        let config: Self = toml::from_str(s).map_err(|e| AccountsError::Config(e.to_string()))?;
        if config.crypto.kdf_iterations == 0 {
            return Err(AccountsError::Config("crypto.kdf_iterations must be positive".to_string()));
        }
        Ok(config)
    }

    /// Read the config at `path`, writing the defaults there first when no
    /// file exists. A file that cannot be read or parsed is an error rather
    /// than a silent fallback, since it decides which database is opened.
    pub fn load_or_create(path: &str) -> Result<Self, AccountsError> {
        if std::path::Path::new(path).exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| AccountsError::Config(format!("reading '{}': {}", path, e)))?;
            let config = Self::from_toml(&s).map_err(|e| match e {
                AccountsError::Config(reason) => AccountsError::Config(format!("parsing '{}': {}", path, reason)),
                other => other,
            })?;
            info!("Config loaded from {}", path);
            Ok(config)
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config to '{}': {}", path, e);
                    }
                }
                Err(e) => warn!("Could not encode default config: {}", e),
            }
            Ok(config)
        }
    }
}
