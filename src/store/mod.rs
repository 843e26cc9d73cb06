//! Durable fingerprint -> key-set id mapping
//!
//! [`CredentialStore`] sits on top of a string-keyed [`KeyValueStore`] and
//! encodes both fingerprint and key-set id as standard base64 without line
//! wrapping. Read failures are absorbed: a missing or undecodable entry is
//! reported as absent.

pub mod file;
pub mod memory;

pub use file::FileKeyValueStore;
pub use memory::{MemoryKeyValueStore, MemoryNamespaces};

use crate::error::{KeysetError, KeysetResult};
use crate::fingerprint::{Fingerprint, KeySetId};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Namespaced, string-keyed durable key-value store
///
/// Every operation is durable when it returns and is atomic for a single
/// key. Implementations may be shared by several stores that use the same
/// namespace.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Namespace this store writes into
    fn namespace(&self) -> &str;

    async fn get(&self, key: &str) -> KeysetResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> KeysetResult<()>;

    /// Remove a key; no-op when absent
    async fn remove(&self, key: &str) -> KeysetResult<()>;

    /// All entries in the namespace, in no particular order
    async fn entries(&self) -> KeysetResult<Vec<(String, String)>>;
}

/// Encode bytes as the textual form used for store keys and values
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode the textual form written by [`encode`]
pub fn decode(text: &str) -> KeysetResult<Vec<u8>> {
    BASE64.decode(text).map_err(|e| KeysetError::decode(text, e))
}

/// Fingerprint -> key-set id cache over a [`KeyValueStore`]
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn namespace(&self) -> &str {
        self.backend.namespace()
    }

    /// Upsert the key-set id stored for a fingerprint
    pub async fn put(&self, fingerprint: &Fingerprint, key_set_id: &KeySetId) -> KeysetResult<()> {
        self.backend
            .put(&encode(fingerprint.as_bytes()), &encode(key_set_id.as_bytes()))
            .await?;
        info!(
            "Stored offline license key for {}: {}",
            fingerprint, key_set_id
        );
        Ok(())
    }

    /// Stored key-set id for a fingerprint; `None` when absent or unreadable
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<KeySetId> {
        let key = encode(fingerprint.as_bytes());
        let value = match self.backend.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cached key set for {}: {}", fingerprint, e);
                return None;
            }
        };

        match decode(&value) {
            Ok(bytes) => Some(KeySetId::new(bytes)),
            Err(e) => {
                warn!("Ignoring cached key set for {}: {}", fingerprint, e);
                None
            }
        }
    }

    /// Remove the entry for a fingerprint; no-op when absent
    pub async fn remove(&self, fingerprint: &Fingerprint) -> KeysetResult<()> {
        self.backend.remove(&encode(fingerprint.as_bytes())).await?;
        debug!("Removed cached key set for {}", fingerprint);
        Ok(())
    }

    /// All decodable entries in the namespace
    pub async fn entries(&self) -> KeysetResult<Vec<(Fingerprint, KeySetId)>> {
        let raw = self.backend.entries().await?;
        let mut entries = Vec::with_capacity(raw.len());

        for (key, value) in raw {
            match (decode(&key), decode(&value)) {
                (Ok(fp), Ok(ks)) => entries.push((Fingerprint::new(fp), KeySetId::new(ks))),
                _ => warn!("Skipping undecodable entry {} in {}", key, self.namespace()),
            }
        }

        Ok(entries)
    }

    /// Remove every entry in the namespace, returning how many were removed
    pub async fn clear(&self) -> KeysetResult<usize> {
        let raw = self.backend.entries().await?;
        for (key, _) in &raw {
            self.backend.remove(key).await?;
        }
        Ok(raw.len())
    }
}
