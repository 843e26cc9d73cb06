//! Configuration schema for keyset-cache
//!
//! Configuration is stored at `~/.config/keyset-cache/config.toml`

use crate::renewal::RENEWAL_THRESHOLD_SECS;
use crate::scheme::WIDEVINE_UUID;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Key-set store settings
    pub store: StoreConfig,

    /// Renewal policy settings
    pub renewal: RenewalConfig,

    /// Platform capability
    pub platform: PlatformConfig,

    /// DRM scheme handled by the coordinator
    pub scheme: SchemeConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Key-set store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Namespace shared by every coordinator using this store
    pub namespace: String,

    /// Store root, defaults to the state directory
    pub dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "drmkeys".to_string(),
            dir: None,
        }
    }
}

/// Renewal policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalConfig {
    /// Renew licenses with less validity left than this
    pub threshold_secs: u64,
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            threshold_secs: RENEWAL_THRESHOLD_SECS,
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform API level, gates pattern encryption and legacy pssh extraction
    pub api_level: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self { api_level: 28 }
    }
}

/// Scheme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeConfig {
    /// DRM system id
    pub uuid: Uuid,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            uuid: WIDEVINE_UUID,
        }
    }
}
