//! License lifecycle events
//!
//! The backend reports lifecycle events from its own execution context.
//! [`EventBridge`] consumes them, updates the cache and the coordinator's
//! pending flag, then notifies the external listener.
//!
//! For `KeysLoaded` and `KeysRestored` the order is fixed: the key set is
//! stored, then the pending flag is cleared, then the listener is called.
//! A listener that immediately acquires again therefore sees the new cache
//! entry and an idle coordinator.

use crate::backend::LicenseBackend;
use crate::coordinator::SessionCoordinator;
use crate::error::KeysetError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle event emitted by a license backend
#[derive(Debug)]
pub enum LicenseEvent {
    /// A fresh license was downloaded
    KeysLoaded,
    /// An offline license was restored
    KeysRestored,
    /// Offline keys were removed, not tied to a particular request
    KeysRemoved,
    /// Acquisition failed
    Error(KeysetError),
}

impl LicenseEvent {
    /// Events that end the outstanding acquisition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::KeysRemoved)
    }
}

/// Receives forwarded lifecycle notifications
pub trait LicenseEventListener: Send + Sync {
    fn on_keys_loaded(&self);

    fn on_error(&self, error: &KeysetError);

    fn on_keys_restored(&self);

    fn on_keys_removed(&self);
}

/// Owned form of a listener notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    KeysLoaded,
    KeysRestored,
    KeysRemoved,
    Error(String),
}

/// Listener that forwards notifications over a channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

impl LicenseEventListener for ChannelListener {
    fn on_keys_loaded(&self) {
        self.send(Notification::KeysLoaded);
    }

    fn on_error(&self, error: &KeysetError) {
        self.send(Notification::Error(error.to_string()));
    }

    fn on_keys_restored(&self) {
        self.send(Notification::KeysRestored);
    }

    fn on_keys_removed(&self) {
        self.send(Notification::KeysRemoved);
    }
}

/// Handles backend lifecycle events on behalf of a coordinator
pub struct EventBridge<B: LicenseBackend> {
    coordinator: Arc<SessionCoordinator<B>>,
    listener: Option<Arc<dyn LicenseEventListener>>,
}

impl<B: LicenseBackend + 'static> EventBridge<B> {
    pub fn new(
        coordinator: Arc<SessionCoordinator<B>>,
        listener: Option<Arc<dyn LicenseEventListener>>,
    ) -> Self {
        Self {
            coordinator,
            listener,
        }
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator<B>> {
        &self.coordinator
    }

    /// Handle one event to completion
    pub async fn dispatch(&self, event: LicenseEvent) {
        debug!("License event: {:?}", event);

        match event {
            LicenseEvent::KeysLoaded => {
                self.coordinator.persist_active_key_set().await;
                self.coordinator.clear_pending();
                if let Some(listener) = &self.listener {
                    listener.on_keys_loaded();
                }
            }
            LicenseEvent::KeysRestored => {
                self.coordinator.persist_active_key_set().await;
                self.coordinator.clear_pending();
                if let Some(listener) = &self.listener {
                    listener.on_keys_restored();
                }
            }
            LicenseEvent::Error(error) => {
                warn!("License acquisition error: {}", error);
                self.coordinator.clear_pending();
                if let Some(listener) = &self.listener {
                    listener.on_error(&error);
                }
            }
            LicenseEvent::KeysRemoved => {
                if let Some(listener) = &self.listener {
                    listener.on_keys_removed();
                }
            }
        }
    }

    /// Process events from `events` in order until the sender side closes
    pub fn spawn(self, mut events: mpsc::UnboundedReceiver<LicenseEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.dispatch(event).await;
            }
            debug!("License event channel closed");
        })
    }
}
