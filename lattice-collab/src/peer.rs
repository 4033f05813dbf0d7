//! One simulated participant.
//!
//! A peer owns its replicated log, presence channel, event bus and offline
//! queue. It never talks to other peers directly: the [`Broker`] calls
//! `deliver` for fan-out and drives `drain_offline` on reconnect.
//!
//! ```text
//!                 deliver(update, sender)
//!                          │
//!            ┌─────────────┴─────────────┐
//!        connected                 disconnected
//!            │                           │
//!            ▼                           ▼
//!  log.apply(update, Remote)    offline.enqueue(update)
//!                                        │  connect()
//!                                        ▼
//!                      log.apply(log.merge(queue), Remote(self))
//! ```
//!
//! [`Broker`]: crate::broker::Broker

use lattice_core::{DocumentSnapshot, PeerId, ReplicatedLog, TextDocument, UpdateOrigin};

use crate::awareness::{AwarenessChannel, AwarenessState, CursorColor};
use crate::error::SimError;
use crate::events::{EventBus, Listener, ListenerId};
use crate::queue::OfflineQueue;

/// Peer connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// What happened to a delivered update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    Queued,
}

/// Per-peer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerStats {
    /// Remote updates applied directly while connected
    pub applied: u64,
    /// Remote updates queued while disconnected
    pub queued: u64,
    /// Offline queue drains (reconnects with a non-empty queue)
    pub drains: u64,
    /// Updates this peer originated on the broker
    pub broadcasts: u64,
}

pub struct Peer<L: ReplicatedLog> {
    id: PeerId,
    connected: bool,
    log: L,
    awareness: AwarenessChannel,
    offline: OfflineQueue,
    events: EventBus<bool>,
    stats: PeerStats,
}

impl<L: ReplicatedLog> Peer<L> {
    pub(crate) fn new(id: PeerId, replica_id: u64) -> Self {
        let awareness = AwarenessChannel::with_state(AwarenessState {
            user_name: None,
            color: CursorColor::from_replica(replica_id),
            cursor: None,
        });
        Self {
            id,
            connected: false,
            log: L::new_replica(replica_id),
            awareness,
            offline: OfflineQueue::new(),
            events: EventBus::new(),
            stats: PeerStats::default(),
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn snapshot(&self) -> L::Snapshot {
        self.log.snapshot()
    }

    /// Full document state as a single update.
    pub fn document_state(&self) -> Vec<u8> {
        self.log.local_update()
    }

    pub fn awareness(&self) -> &AwarenessChannel {
        &self.awareness
    }

    pub fn awareness_mut(&mut self) -> &mut AwarenessChannel {
        &mut self.awareness
    }

    pub fn offline_queue(&self) -> &OfflineQueue {
        &self.offline
    }

    pub fn events(&self) -> &EventBus<bool> {
        &self.events
    }

    /// Register a lifecycle listener (see [`SYNC_EVENT`](crate::events::SYNC_EVENT)).
    pub fn on(&mut self, event: &str, listener: Listener<bool>) -> ListenerId {
        self.events.on(event, listener)
    }

    pub fn off(&mut self, event: &str, id: ListenerId) -> bool {
        self.events.off(event, id)
    }

    pub fn stats(&self) -> PeerStats {
        self.stats
    }

    /// Apply a remote update, or queue it when offline.
    pub(crate) fn deliver(&mut self, update: &[u8], sender: &PeerId) -> Result<Delivery, SimError> {
        if !self.connected {
            self.offline.enqueue(update.to_vec());
            self.stats.queued += 1;
            log::debug!(
                "Peer {} offline, queued {} bytes from {sender} ({} pending)",
                self.id,
                update.len(),
                self.offline.len()
            );
            return Ok(Delivery::Queued);
        }

        let origin = UpdateOrigin::RemoteApply(sender.clone());
        self.log
            .apply(update, &origin)
            .map_err(|source| self.conflict(source))?;
        self.stats.applied += 1;
        log::debug!("Peer {} applied {} bytes from {sender}", self.id, update.len());
        Ok(Delivery::Applied)
    }

    /// Merge the offline queue into one update, apply it, then clear.
    ///
    /// Returns how many queued updates were merged. On failure the queue is
    /// left untouched.
    pub(crate) fn drain_offline(&mut self) -> Result<usize, SimError> {
        if self.offline.is_empty() {
            return Ok(0);
        }

        let count = self.offline.len();
        let merged = self
            .log
            .merge(self.offline.updates())
            .map_err(|source| self.conflict(source))?;
        let origin = UpdateOrigin::RemoteApply(self.id.clone());
        self.log
            .apply(&merged, &origin)
            .map_err(|source| self.conflict(source))?;

        self.offline.clear();
        self.stats.drains += 1;
        Ok(count)
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn note_broadcast(&mut self) {
        self.stats.broadcasts += 1;
    }

    /// Run a local mutation against the log. `edit` returns the delta the
    /// mutation produced.
    pub(crate) fn edit_local<F>(&mut self, edit: F) -> Vec<u8>
    where
        F: FnOnce(&mut L) -> Vec<u8>,
    {
        let delta = edit(&mut self.log);
        log::trace!("Peer {} local edit, {} byte delta", self.id, delta.len());
        delta
    }

    fn conflict(&self, source: lattice_core::LogError) -> SimError {
        log::warn!("Peer {} rejected update: {source}", self.id);
        SimError::ApplyConflict {
            peer: self.id.clone(),
            source,
        }
    }
}

impl Peer<TextDocument> {
    /// What an editor mounted on this peer would show.
    pub fn rendered_output(&self) -> String {
        self.log.snapshot().render()
    }

    pub fn document_snapshot(&self) -> DocumentSnapshot {
        self.log.snapshot()
    }
}
