//! Error types for keyset-cache
//!
//! All modules use `KeysetResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for keyset-cache operations
pub type KeysetResult<T> = Result<T, KeysetError>;

/// All errors that can occur in keyset-cache
#[derive(Error, Debug)]
pub enum KeysetError {
    // Scheme errors
    #[error("No scheme data for scheme {0}")]
    MissingSchemeData(Uuid),

    // Backend errors
    #[error("License validity query failed: {0}")]
    LicenseQuery(String),

    #[error("License teardown failed: {0}")]
    Teardown(String),

    #[error("License acquisition failed: {0}")]
    Acquisition(String),

    // Store errors
    #[error("Store IO error: {context}")]
    StoreIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode stored value for {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("Invalid fingerprint argument: {0}")]
    FingerprintArg(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl KeysetError {
    /// Create a store IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreIo {
            context: context.into(),
            source,
        }
    }

    /// Create a decode error for a stored key
    pub fn decode(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    ///
    /// Acquisition and query failures come from the license server round
    /// trip and may succeed on the next request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LicenseQuery(_) | Self::Acquisition(_) | Self::StoreIo { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingSchemeData(_) => {
                Some("Check can_acquire_session before acquiring a session")
            }
            Self::FingerprintArg(_) => {
                Some("Pass the fingerprint as stored (base64) or as hex:<digits>")
            }
            Self::ConfigInvalid { .. } => Some("Run: keyset-cache config init --force"),
            _ => None,
        }
    }
}
