//! Test doubles for coordinator and event tests.
//!
//! [`ScriptedBackend`] is an in-process [`LicenseBackend`] whose validity
//! answers, active key set and failure behaviour are set up front, and which
//! records every call the coordinator makes. [`CountingStore`] wraps a
//! [`KeyValueStore`] and counts accesses.
//!
//! ```
//! use std::sync::Arc;
//! use keyset_cache::backend::LicenseMode;
//! use keyset_cache::coordinator::SessionCoordinator;
//! use keyset_cache::scheme::{DrmInitData, SchemeData, WIDEVINE_UUID};
//! use keyset_cache::store::{CredentialStore, MemoryKeyValueStore};
//! use keyset_cache::testing::ScriptedBackend;
//!
//! # tokio_test_main();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test_main() {
//! let backend = Arc::new(ScriptedBackend::new());
//! let store = CredentialStore::new(Arc::new(MemoryKeyValueStore::new("drmkeys")));
//! let coord = SessionCoordinator::new(WIDEVINE_UUID, Arc::clone(&backend), store);
//!
//! let init = DrmInitData::new(vec![SchemeData::new(WIDEVINE_UUID, None, b"F1".to_vec())]);
//! coord.acquire_session((), &init).await.unwrap();
//! assert_eq!(backend.mode_changes(), vec![LicenseMode::AcquireFresh]);
//! # }
//! ```

use crate::backend::{LicenseBackend, LicenseMode};
use crate::error::{KeysetError, KeysetResult};
use crate::fingerprint::KeySetId;
use crate::renewal::RemainingValidity;
use crate::scheme::DrmInitData;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Session handle returned by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedSession {
    pub id: usize,
    /// Mode the backend was in when the session was acquired
    pub mode: Option<LicenseMode>,
}

#[derive(Debug, Default)]
struct BackendState {
    mode: Option<LicenseMode>,
    mode_changes: Vec<LicenseMode>,
    active: Option<KeySetId>,
    validity: HashMap<KeySetId, RemainingValidity>,
    failing_queries: HashSet<KeySetId>,
    teardown_fails: bool,
    teardowns: Vec<KeySetId>,
    acquisitions: usize,
    releases: usize,
    validity_queries: usize,
}

/// Scripted in-process license backend
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    state: Mutex<BackendState>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Key set reported by `active_key_set_id`
    pub fn set_active(&self, key_set_id: Option<KeySetId>) {
        self.state().active = key_set_id;
    }

    pub fn set_validity(&self, key_set_id: &KeySetId, remaining: RemainingValidity) {
        self.state().validity.insert(key_set_id.clone(), remaining);
    }

    /// Make validity queries for `key_set_id` fail
    pub fn fail_validity(&self, key_set_id: &KeySetId) {
        self.state().failing_queries.insert(key_set_id.clone());
    }

    pub fn fail_teardown(&self) {
        self.state().teardown_fails = true;
    }

    pub fn mode_changes(&self) -> Vec<LicenseMode> {
        self.state().mode_changes.clone()
    }

    pub fn teardowns(&self) -> Vec<KeySetId> {
        self.state().teardowns.clone()
    }

    pub fn acquisitions(&self) -> usize {
        self.state().acquisitions
    }

    pub fn releases(&self) -> usize {
        self.state().releases
    }

    pub fn validity_queries(&self) -> usize {
        self.state().validity_queries
    }
}

#[async_trait]
impl LicenseBackend for ScriptedBackend {
    type Context = ();
    type Session = ScriptedSession;

    async fn acquire_session(&self, _context: (), _init_data: &DrmInitData) -> ScriptedSession {
        let mut state = self.state();
        state.acquisitions += 1;
        ScriptedSession {
            id: state.acquisitions,
            mode: state.mode.clone(),
        }
    }

    async fn release_session(&self, _session: ScriptedSession) {
        self.state().releases += 1;
    }

    async fn set_mode(&self, mode: LicenseMode) {
        let mut state = self.state();
        state.mode = Some(mode.clone());
        state.mode_changes.push(mode);
    }

    async fn active_key_set_id(&self) -> Option<KeySetId> {
        self.state().active.clone()
    }

    async fn remaining_validity(&self, key_set_id: &KeySetId) -> KeysetResult<RemainingValidity> {
        let mut state = self.state();
        state.validity_queries += 1;
        if state.failing_queries.contains(key_set_id) {
            return Err(KeysetError::LicenseQuery(format!(
                "no license for key set {}",
                key_set_id
            )));
        }
        state
            .validity
            .get(key_set_id)
            .copied()
            .ok_or_else(|| KeysetError::LicenseQuery(format!("unknown key set {}", key_set_id)))
    }

    async fn teardown(&self, key_set_id: &KeySetId) -> KeysetResult<()> {
        let mut state = self.state();
        state.teardowns.push(key_set_id.clone());
        if state.teardown_fails {
            return Err(KeysetError::Teardown("session busy".to_string()));
        }
        Ok(())
    }
}

/// Key-value store wrapper counting each kind of access
pub struct CountingStore {
    inner: Arc<dyn KeyValueStore>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    removes: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    async fn get(&self, key: &str) -> KeysetResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> KeysetResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> KeysetResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }

    async fn entries(&self) -> KeysetResult<Vec<(String, String)>> {
        self.inner.entries().await
    }
}
