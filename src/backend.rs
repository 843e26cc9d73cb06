//! License acquisition backend abstraction
//!
//! The backend owns the DRM session protocol: it opens sessions, talks to
//! the license server and reports lifecycle events. The coordinator only
//! decides which mode the next acquisition runs in.

use crate::error::KeysetResult;
use crate::fingerprint::KeySetId;
use crate::renewal::RemainingValidity;
use crate::scheme::DrmInitData;
use async_trait::async_trait;

/// How the backend should obtain keys for the next session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseMode {
    /// Restore keys from a previously downloaded offline license
    UseExisting(KeySetId),
    /// Download a fresh offline license
    AcquireFresh,
}

/// Abstract license acquisition backend
///
/// Acquisition failures are not returned from [`acquire_session`]; the
/// backend reports them later through its lifecycle events.
///
/// [`acquire_session`]: LicenseBackend::acquire_session
#[async_trait]
pub trait LicenseBackend: Send + Sync {
    /// Playback context the session is bound to
    type Context: Send + 'static;

    /// Handle to an acquired DRM session
    type Session: Send + 'static;

    /// Acquire a session for the given init data using the current mode
    async fn acquire_session(&self, context: Self::Context, init_data: &DrmInitData)
        -> Self::Session;

    /// Release a session previously returned by `acquire_session`
    async fn release_session(&self, session: Self::Session);

    /// Select the mode used by the next `acquire_session`
    async fn set_mode(&self, mode: LicenseMode);

    /// Key-set id of the most recently issued or restored offline license
    async fn active_key_set_id(&self) -> Option<KeySetId>;

    /// Remaining playback and license windows for a stored key-set id
    async fn remaining_validity(&self, key_set_id: &KeySetId) -> KeysetResult<RemainingValidity>;

    /// Release backend resources held for a key-set id
    async fn teardown(&self, key_set_id: &KeySetId) -> KeysetResult<()>;
}
