//! Session coordinator
//!
//! Sits in front of a [`LicenseBackend`] and decides, per acquisition,
//! whether a stored offline license can be restored or a fresh one must be
//! downloaded.
//!
//! # Request flow
//!
//! | Guard | Cached key set | Validity | Mode set |
//! |-------|----------------|----------|----------|
//! | pending | - | - | unchanged |
//! | idle | none | - | `AcquireFresh` |
//! | idle | found | query failed | `AcquireFresh` (entry discarded) |
//! | idle | found | below threshold | `AcquireFresh` (entry discarded) |
//! | idle | found | sufficient | `UseExisting` unless already active |
//!
//! The guard is set on entry to the caching path and cleared only by a
//! terminal lifecycle event (see [`crate::events`]) or by
//! [`SessionCoordinator::release_session`]. If the backend never reports a
//! terminal event the guard stays set.

mod guard;

pub use guard::SingleFlightGuard;

use crate::backend::{LicenseBackend, LicenseMode};
use crate::config::Config;
use crate::error::{KeysetError, KeysetResult};
use crate::fingerprint::{normalize, Fingerprint, KeySetId};
use crate::renewal::{RenewalDecision, RenewalPolicy};
use crate::scheme::{DrmInitData, PlatformCapability, SchemeKind};
use crate::store::CredentialStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Caching front for one scheme / backend pairing
pub struct SessionCoordinator<B: LicenseBackend> {
    scheme: Uuid,
    backend: Arc<B>,
    store: CredentialStore,
    policy: RenewalPolicy,
    platform: PlatformCapability,
    guard: SingleFlightGuard,
    /// Fingerprint of the request that last entered the caching path
    current: Mutex<Option<Fingerprint>>,
}

impl<B: LicenseBackend> SessionCoordinator<B> {
    pub fn new(scheme: Uuid, backend: Arc<B>, store: CredentialStore) -> Self {
        Self {
            scheme,
            backend,
            store,
            policy: RenewalPolicy::default(),
            platform: PlatformCapability::default(),
            guard: SingleFlightGuard::new(),
            current: Mutex::new(None),
        }
    }

    /// Build a coordinator using scheme, platform and renewal settings from config
    pub fn from_config(config: &Config, backend: Arc<B>, store: CredentialStore) -> Self {
        Self::new(config.scheme.uuid, backend, store)
            .with_policy(RenewalPolicy::with_threshold(config.renewal.threshold_secs))
            .with_platform(PlatformCapability::new(config.platform.api_level))
    }

    pub fn with_policy(mut self, policy: RenewalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_platform(mut self, platform: PlatformCapability) -> Self {
        self.platform = platform;
        self
    }

    pub fn scheme(&self) -> Uuid {
        self.scheme
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Whether an acquisition is currently outstanding
    pub fn is_pending(&self) -> bool {
        self.guard.is_pending()
    }

    pub async fn current_fingerprint(&self) -> Option<Fingerprint> {
        self.current.lock().await.clone()
    }

    /// Whether this coordinator can acquire a session for the given init data
    pub fn can_acquire_session(&self, init_data: &DrmInitData) -> bool {
        let Some(scheme_data) = init_data.get(self.scheme) else {
            return false;
        };
        self.platform
            .supports(SchemeKind::classify(scheme_data.scheme_type.as_deref()))
    }

    /// Acquire a session, restoring a cached offline license when it is
    /// still valid long enough.
    ///
    /// While another acquisition is pending the request goes straight to
    /// the backend without consulting the cache or changing the mode.
    pub async fn acquire_session(
        &self,
        context: B::Context,
        init_data: &DrmInitData,
    ) -> KeysetResult<B::Session> {
        if !self.guard.try_acquire() {
            info!("Already pending request");
            return Ok(self.backend.acquire_session(context, init_data).await);
        }
        debug!("Request, was not yet pending");

        let Some(scheme_data) = init_data.get(self.scheme) else {
            // Nothing will emit a terminal event for this request.
            self.guard.release();
            return Err(KeysetError::MissingSchemeData(self.scheme));
        };

        let fingerprint = normalize(&scheme_data.data, self.platform.needs_legacy_extraction());
        info!("Request for key for init data {}", fingerprint);
        *self.current.lock().await = Some(fingerprint.clone());

        match self.usable_cached_key_set(&fingerprint).await {
            Some(key_set_id) => {
                if self.backend.active_key_set_id().await.as_ref() != Some(&key_set_id) {
                    self.backend
                        .set_mode(LicenseMode::UseExisting(key_set_id))
                        .await;
                }
            }
            None => {
                info!("No cached key set found");
                self.backend.set_mode(LicenseMode::AcquireFresh).await;
            }
        }

        let session = self.backend.acquire_session(context, init_data).await;
        debug!("Acquire license request is done");
        Ok(session)
    }

    /// Release a session. Always clears the pending flag.
    pub async fn release_session(&self, session: B::Session) {
        self.guard.release();
        self.backend.release_session(session).await;
    }

    /// Cached key set for `fingerprint` if it may be reused; discards it otherwise
    async fn usable_cached_key_set(&self, fingerprint: &Fingerprint) -> Option<KeySetId> {
        let key_set_id = self.store.get(fingerprint).await?;
        info!("Cached key set found {}", key_set_id);

        let remaining = match self.backend.remaining_validity(&key_set_id).await {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!("Error querying cached license validity: {}", e);
                self.discard(fingerprint, &key_set_id).await;
                return None;
            }
        };
        info!(
            "Validity: {} sec / {} sec",
            remaining.playback_secs, remaining.license_secs
        );

        match self.policy.decide_for(remaining) {
            RenewalDecision::Reuse => Some(key_set_id),
            RenewalDecision::Renew => {
                info!("License should be renewed");
                self.discard(fingerprint, &key_set_id).await;
                None
            }
        }
    }

    /// Drop a cached entry and tear down backend state for it.
    ///
    /// Both steps are best-effort: failures are logged and the caller
    /// proceeds to download a fresh license.
    async fn discard(&self, fingerprint: &Fingerprint, key_set_id: &KeySetId) {
        if let Err(e) = self.store.remove(fingerprint).await {
            warn!("Failed to remove cached key set for {}: {}", fingerprint, e);
        }
        if let Err(e) = self.backend.teardown(key_set_id).await {
            debug!("Error releasing expired license, ignoring: {}", e);
        }
    }

    /// Persist the backend's newly issued key set under the current fingerprint
    pub(crate) async fn persist_active_key_set(&self) {
        let Some(key_set_id) = self.backend.active_key_set_id().await else {
            info!("Failed to download offline license key");
            return;
        };
        let Some(fingerprint) = self.current_fingerprint().await else {
            warn!("Key set {} issued with no request in flight, not stored", key_set_id);
            return;
        };
        if let Err(e) = self.store.put(&fingerprint, &key_set_id).await {
            warn!("Failed to store key set for {}: {}", fingerprint, e);
        }
    }

    pub(crate) fn clear_pending(&self) {
        self.guard.release();
    }
}
