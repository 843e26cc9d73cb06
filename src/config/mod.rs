//! Configuration management for keyset-cache

pub mod schema;

pub use schema::Config;

use crate::error::{KeysetError, KeysetResult};
use crate::store::{CredentialStore, FileKeyValueStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyset-cache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyset-cache")
    }

    /// Root directory for key-set store namespaces
    pub fn store_root(config: &Config) -> PathBuf {
        config
            .store
            .dir
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("store"))
    }

    /// Open the durable credential store described by the config
    pub async fn open_store(config: &Config) -> KeysetResult<CredentialStore> {
        let root = Self::store_root(config);
        let kv = FileKeyValueStore::open(&root, &config.store.namespace).await?;
        debug!("Opened key-set store at {}", kv.dir().display());
        Ok(CredentialStore::new(Arc::new(kv)))
    }

    /// Load configuration; a missing file yields the defaults
    pub async fn load(&self) -> KeysetResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config file {} not found, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(KeysetError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| KeysetError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> KeysetResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            KeysetError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> KeysetResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KeysetError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
