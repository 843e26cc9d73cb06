//! In-memory key-value store
//!
//! Handles opened for the same namespace from one [`MemoryNamespaces`]
//! registry share their entries, the way several managers in one process
//! share one preferences file.

use crate::error::{KeysetError, KeysetResult};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

type Entries = Arc<RwLock<HashMap<String, String>>>;

/// Namespaced in-memory store; clones share the same entries
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    namespace: String,
    entries: Entries,
}

impl MemoryKeyValueStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Entries::default(),
        }
    }

    fn poisoned(&self) -> KeysetError {
        KeysetError::Internal(format!("memory store {} lock poisoned", self.namespace))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> KeysetResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> KeysetResult<()> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> KeysetResult<()> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        entries.remove(key);
        Ok(())
    }

    async fn entries(&self) -> KeysetResult<Vec<(String, String)>> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Registry handing out shared in-memory namespaces
#[derive(Debug, Default)]
pub struct MemoryNamespaces {
    namespaces: Mutex<HashMap<String, MemoryKeyValueStore>>,
}

impl MemoryNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a namespace, creating it on first use
    pub fn open(&self, namespace: &str) -> KeysetResult<MemoryKeyValueStore> {
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|_| KeysetError::Internal("memory namespaces lock poisoned".to_string()))?;

        Ok(namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| MemoryKeyValueStore::new(namespace))
            .clone())
    }
}
