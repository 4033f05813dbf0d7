//! Fan-out broadcast to N-1 peers with offline queueing.
//!
//! The broker owns every peer. A broadcast walks the registry in id order
//! and delivers the update to each peer except the sender: connected peers
//! apply it immediately, disconnected peers append it to their offline
//! queue. Per-peer delivery order is the broadcast call order.
//!
//! Everything here is synchronous. An operation runs to completion before
//! the next one starts, which is what makes reconnect atomic with respect
//! to broadcasts. See [`SharedBroker`](crate::shared::SharedBroker) for the
//! locked variant.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use lattice_core::{PeerId, ReplicatedLog, TextDocument};

use crate::error::SimError;
use crate::events::SYNC_EVENT;
use crate::peer::{Delivery, Peer};

/// Broker-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub broadcasts: u64,
    /// Deliveries applied to a connected peer
    pub applied: u64,
    /// Deliveries queued for a disconnected peer
    pub queued: u64,
}

/// Who received a broadcast, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub applied: Vec<PeerId>,
    pub queued: Vec<PeerId>,
}

impl BroadcastReport {
    pub fn recipients(&self) -> usize {
        self.applied.len() + self.queued.len()
    }
}

/// Result of [`Broker::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Peer was already connected; nothing happened.
    AlreadyConnected,
    Connected {
        /// Offline updates merged before rebroadcast
        drained: usize,
        /// Delivery of this peer's state to the others
        report: BroadcastReport,
    },
}

/// Registry of peers sharing one simulated network.
pub struct Broker<L: ReplicatedLog = TextDocument> {
    peers: BTreeMap<PeerId, Peer<L>>,
    next_replica: u64,
    stats: BrokerStats,
}

impl<L: ReplicatedLog> Broker<L> {
    pub fn new() -> Self {
        Self {
            peers: BTreeMap::new(),
            next_replica: 0,
            stats: BrokerStats::default(),
        }
    }

    /// Create and store a new, disconnected peer.
    ///
    /// Replica ids are handed out sequentially from 1 in registration
    /// order, so a run is reproducible.
    pub fn register_peer(&mut self, id: impl Into<PeerId>) -> Result<&mut Peer<L>, SimError> {
        match self.peers.entry(id.into()) {
            Entry::Occupied(entry) => {
                log::warn!("Rejected duplicate peer id {}", entry.key());
                Err(SimError::DuplicateId(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                self.next_replica += 1;
                log::info!("Registered peer {} (replica {})", entry.key(), self.next_replica);
                let peer = Peer::new(entry.key().clone(), self.next_replica);
                Ok(entry.insert(peer))
            }
        }
    }

    /// Deliver `update` from `sender` to every other registered peer.
    ///
    /// Apply failures are returned unchanged; peers earlier in id order
    /// keep what they already applied.
    pub fn broadcast(
        &mut self,
        sender: impl AsRef<str>,
        update: &[u8],
    ) -> Result<BroadcastReport, SimError> {
        let sender = self.require_mut(sender.as_ref())?.id().clone();

        let mut report = BroadcastReport::default();
        for (id, peer) in self.peers.iter_mut() {
            if *id == sender {
                continue;
            }
            match peer.deliver(update, &sender)? {
                Delivery::Applied => {
                    self.stats.applied += 1;
                    report.applied.push(id.clone());
                }
                Delivery::Queued => {
                    self.stats.queued += 1;
                    report.queued.push(id.clone());
                }
            }
        }

        self.require_mut(sender.as_str())?.note_broadcast();
        self.stats.broadcasts += 1;
        Ok(report)
    }

    /// Bring a peer online.
    ///
    /// Captures the peer's full state, merges and applies its offline
    /// queue, rebroadcasts the captured state, marks it connected and fires
    /// [`SYNC_EVENT`]. A no-op when already connected.
    pub fn connect(&mut self, id: impl AsRef<str>) -> Result<ConnectOutcome, SimError> {
        let peer = self.require_mut(id.as_ref())?;
        if peer.is_connected() {
            log::debug!("Peer {} already connected", peer.id());
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let peer_id = peer.id().clone();
        let state = peer.document_state();
        let drained = peer.drain_offline()?;
        if drained > 0 {
            log::info!("Peer {peer_id} merged {drained} queued updates on reconnect");
        }

        let report = self.broadcast(&peer_id, &state)?;

        let peer = self.require_mut(peer_id.as_str())?;
        peer.set_connected(true);
        peer.events().emit(SYNC_EVENT, &true);
        log::info!("Peer {peer_id} connected ({} recipients)", report.recipients());

        Ok(ConnectOutcome::Connected { drained, report })
    }

    /// Take a peer offline. Nothing else changes.
    pub fn disconnect(&mut self, id: impl AsRef<str>) -> Result<(), SimError> {
        let peer = self.require_mut(id.as_ref())?;
        peer.set_connected(false);
        log::info!("Peer {} disconnected", peer.id());
        Ok(())
    }

    /// Run a local edit on a peer.
    ///
    /// `edit` receives the peer's log and returns the delta it produced.
    /// A connected peer broadcasts the delta straight away; a disconnected
    /// one keeps it latent until its next [`connect`](Self::connect)
    /// rebroadcasts the full state. Returns the broadcast report, if any.
    pub fn apply_local_edit<F>(
        &mut self,
        id: impl AsRef<str>,
        edit: F,
    ) -> Result<Option<BroadcastReport>, SimError>
    where
        F: FnOnce(&mut L) -> Vec<u8>,
    {
        let peer = self.require_mut(id.as_ref())?;
        let delta = peer.edit_local(edit);
        let sender = peer.id().clone();

        if !peer.is_connected() {
            log::debug!("Peer {sender} offline, local edit stays latent");
            return Ok(None);
        }
        self.broadcast(&sender, &delta).map(Some)
    }

    pub fn peer(&self, id: impl AsRef<str>) -> Option<&Peer<L>> {
        self.peers.get(id.as_ref())
    }

    pub fn peer_mut(&mut self, id: impl AsRef<str>) -> Option<&mut Peer<L>> {
        self.peers.get_mut(id.as_ref())
    }

    /// Peers in id order.
    pub fn peers(&self) -> impl Iterator<Item = &Peer<L>> {
        self.peers.values()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn stats(&self) -> BrokerStats {
        self.stats
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Peer<L>, SimError> {
        self.peers
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownPeer(PeerId::from(id)))
    }
}

impl<L: ReplicatedLog> Default for Broker<L> {
    fn default() -> Self {
        Self::new()
    }
}
