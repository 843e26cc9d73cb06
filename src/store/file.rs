//! File-backed key-value store
//!
//! Layout: `<root>/<namespace>/<sha256(key)>.json`, each file holding one
//! entry as JSON. Writes go to a temporary file that is synced and renamed
//! into place, so a reader sees either the old or the new entry. Temp names
//! are unique per process, so several stores may share a namespace.

use crate::error::{KeysetError, KeysetResult};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One persisted entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable store with one JSON file per key
#[derive(Debug)]
pub struct FileKeyValueStore {
    namespace: String,
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open (and create if needed) the namespace directory under `root`
    pub async fn open(root: &Path, namespace: &str) -> KeysetResult<Self> {
        let dir = root.join(namespace);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| KeysetError::io(format!("creating store dir {}", dir.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&dir, perms)
                .map_err(|e| KeysetError::io("setting store dir permissions", e))?;
        }

        Ok(Self {
            namespace: namespace.to_string(),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    fn tmp_path(path: &Path) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("json.{}.{}.tmp", std::process::id(), n))
    }

    /// Create `tmp` owner-only, write `content` and flush it to disk
    async fn write_synced(tmp: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(tmp).await?;
        file.write_all(content).await?;
        file.sync_all().await
    }

    /// Persist the directory entry itself after a rename or unlink
    async fn sync_dir(&self) -> KeysetResult<()> {
        #[cfg(unix)]
        {
            let dir = fs::File::open(&self.dir)
                .await
                .map_err(|e| KeysetError::io("opening store dir for sync", e))?;
            dir.sync_all()
                .await
                .map_err(|e| KeysetError::io("syncing store dir", e))?;
        }
        Ok(())
    }

    async fn replace(tmp: &Path, path: &Path, content: &[u8]) -> KeysetResult<()> {
        Self::write_synced(tmp, content)
            .await
            .map_err(|e| KeysetError::io(format!("writing store file {}", tmp.display()), e))?;

        fs::rename(tmp, path)
            .await
            .map_err(|e| KeysetError::io(format!("replacing store file {}", path.display()), e))
    }

    async fn read_entry(path: &Path) -> KeysetResult<Option<StoredEntry>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| KeysetError::io(format!("reading store file {}", path.display()), e))?;

        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> KeysetResult<Option<String>> {
        let path = self.entry_path(key);
        match Self::read_entry(&path).await? {
            Some(entry) if entry.key == key => Ok(Some(entry.value)),
            Some(_) => {
                warn!("Store file {} belongs to another key", path.display());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> KeysetResult<()> {
        let path = self.entry_path(key);
        let tmp = Self::tmp_path(&path);
        let entry = StoredEntry {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&entry)?;

        if let Err(e) = Self::replace(&tmp, &path, content.as_bytes()).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                debug!("Could not remove temp file {}: {}", tmp.display(), cleanup);
            }
            return Err(e);
        }
        self.sync_dir().await?;

        debug!("Wrote store entry {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> KeysetResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => self.sync_dir().await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeysetError::io(
                format!("removing store file {}", path.display()),
                e,
            )),
        }
    }

    async fn entries(&self) -> KeysetResult<Vec<(String, String)>> {
        let mut entries = vec![];
        let mut dir = fs::read_dir(&self.dir)
            .await
            .map_err(|e| KeysetError::io("reading store directory", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| KeysetError::io("reading store entry", e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(stored)) => entries.push((stored.key, stored.value)),
                Ok(None) => {}
                Err(e) => warn!("Skipping store file {}: {}", path.display(), e),
            }
        }

        Ok(entries)
    }
}
