//! Locked broker handle for concurrent drivers.
//!
//! The plain [`Broker`] relies on single-threaded execution for atomicity.
//! When several tasks drive peers at once, `SharedBroker` holds one
//! exclusive lock for the whole of every operation, so a reconnect drain
//! can never interleave with a broadcast addressed to the same peer.

use std::sync::Arc;
use tokio::sync::Mutex;

use lattice_core::{PeerId, ReplicatedLog, TextDocument};

use crate::broker::{BroadcastReport, Broker, ConnectOutcome};
use crate::error::SimError;

/// Cloneable, lock-protected broker.
pub struct SharedBroker<L: ReplicatedLog = TextDocument> {
    inner: Arc<Mutex<Broker<L>>>,
}

impl<L: ReplicatedLog> Clone for SharedBroker<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L: ReplicatedLog> SharedBroker<L> {
    pub fn new(broker: Broker<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(broker)),
        }
    }

    pub async fn register_peer(&self, id: impl Into<PeerId>) -> Result<(), SimError> {
        self.inner.lock().await.register_peer(id).map(|_| ())
    }

    pub async fn connect(&self, id: impl AsRef<str>) -> Result<ConnectOutcome, SimError> {
        self.inner.lock().await.connect(id)
    }

    pub async fn disconnect(&self, id: impl AsRef<str>) -> Result<(), SimError> {
        self.inner.lock().await.disconnect(id)
    }

    pub async fn broadcast(
        &self,
        sender: impl AsRef<str>,
        update: &[u8],
    ) -> Result<BroadcastReport, SimError> {
        self.inner.lock().await.broadcast(sender, update)
    }

    pub async fn apply_local_edit<F>(
        &self,
        id: impl AsRef<str>,
        edit: F,
    ) -> Result<Option<BroadcastReport>, SimError>
    where
        F: FnOnce(&mut L) -> Vec<u8>,
    {
        self.inner.lock().await.apply_local_edit(id, edit)
    }

    pub async fn snapshot(&self, id: impl AsRef<str>) -> Result<L::Snapshot, SimError> {
        let id = id.as_ref();
        self.inner
            .lock()
            .await
            .peer(id)
            .map(|peer| peer.snapshot())
            .ok_or_else(|| SimError::UnknownPeer(PeerId::from(id)))
    }

    pub async fn is_connected(&self, id: impl AsRef<str>) -> Result<bool, SimError> {
        let id = id.as_ref();
        self.inner
            .lock()
            .await
            .peer(id)
            .map(|peer| peer.is_connected())
            .ok_or_else(|| SimError::UnknownPeer(PeerId::from(id)))
    }

    pub async fn offline_len(&self, id: impl AsRef<str>) -> Result<usize, SimError> {
        let id = id.as_ref();
        self.inner
            .lock()
            .await
            .peer(id)
            .map(|peer| peer.offline_queue().len())
            .ok_or_else(|| SimError::UnknownPeer(PeerId::from(id)))
    }

    /// Run `f` with exclusive access to the broker.
    pub async fn with_broker<R>(&self, f: impl FnOnce(&mut Broker<L>) -> R) -> R {
        let mut broker = self.inner.lock().await;
        f(&mut broker)
    }
}

impl<L: ReplicatedLog> Default for SharedBroker<L> {
    fn default() -> Self {
        Self::new(Broker::new())
    }
}
