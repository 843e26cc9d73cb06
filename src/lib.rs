//! keyset-cache - offline license key-set cache
//!
//! Caches offline license key-set ids by content fingerprint in front of a
//! slow license acquisition backend. Cached licenses close to expiry are
//! discarded and re-acquired, and a single-flight guard keeps overlapping
//! requests from consulting the cache concurrently.

pub mod backend;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod renewal;
pub mod scheme;
pub mod store;
pub mod testing;

pub use backend::{LicenseBackend, LicenseMode};
pub use coordinator::SessionCoordinator;
pub use error::{KeysetError, KeysetResult};
pub use events::{EventBridge, LicenseEvent, LicenseEventListener};
pub use fingerprint::{Fingerprint, KeySetId};
pub use renewal::{RenewalDecision, RenewalPolicy};
pub use store::CredentialStore;
