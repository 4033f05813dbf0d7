//! Scripted multi-peer scenarios.
//!
//! A [`Harness`] owns a broker pre-populated from a [`SimConfig`] and
//! addresses peers by index, which is what tests and benches want. It adds
//! convergence checks and a small schedule language ([`Step`]) for driving
//! randomized runs.

use lattice_core::{PeerId, ReplicatedLog, TextDocument, TextEditor};

use crate::broker::{BroadcastReport, Broker, ConnectOutcome};
use crate::error::SimError;

/// Harness configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of peers to register
    pub peer_count: usize,
    /// Peer ids are `{id_prefix}{index}`
    pub id_prefix: String,
    /// Connect every peer after registration
    pub start_connected: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            peer_count: 2,
            id_prefix: "peer".to_string(),
            start_connected: false,
        }
    }
}

/// One scripted action against a peer index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Connect(usize),
    Disconnect(usize),
    Insert { peer: usize, index: u32, text: String },
    Remove { peer: usize, index: u32, len: u32 },
}

pub struct Harness<L: ReplicatedLog = TextDocument> {
    broker: Broker<L>,
    ids: Vec<PeerId>,
}

impl<L: ReplicatedLog> Harness<L> {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let mut broker = Broker::new();
        let mut ids = Vec::with_capacity(config.peer_count);

        for index in 0..config.peer_count {
            let id = PeerId::new(format!("{}{index}", config.id_prefix));
            broker.register_peer(id.clone())?;
            ids.push(id);
        }

        let mut harness = Self { broker, ids };
        if config.start_connected {
            harness.connect_all()?;
        }

        log::info!(
            "Harness ready: {} peers, connected: {}",
            config.peer_count,
            config.start_connected
        );
        Ok(harness)
    }

    /// Id of the peer at `index`.
    pub fn id(&self, index: usize) -> Result<&PeerId, SimError> {
        self.ids.get(index).ok_or(SimError::PeerIndex(index))
    }

    pub fn peer_count(&self) -> usize {
        self.ids.len()
    }

    pub fn connect(&mut self, index: usize) -> Result<ConnectOutcome, SimError> {
        let id = self.id(index)?.clone();
        self.broker.connect(id)
    }

    pub fn disconnect(&mut self, index: usize) -> Result<(), SimError> {
        let id = self.id(index)?.clone();
        self.broker.disconnect(id)
    }

    /// Connect peers in index order.
    pub fn connect_all(&mut self) -> Result<(), SimError> {
        for index in 0..self.ids.len() {
            self.connect(index)?;
        }
        Ok(())
    }

    pub fn disconnect_all(&mut self) -> Result<(), SimError> {
        for index in 0..self.ids.len() {
            self.disconnect(index)?;
        }
        Ok(())
    }

    /// Run a raw log mutation on a peer (see [`Broker::apply_local_edit`]).
    pub fn edit_log<F>(&mut self, index: usize, edit: F) -> Result<Option<BroadcastReport>, SimError>
    where
        F: FnOnce(&mut L) -> Vec<u8>,
    {
        let id = self.id(index)?.clone();
        self.broker.apply_local_edit(id, edit)
    }

    pub fn snapshot(&self, index: usize) -> Result<L::Snapshot, SimError> {
        let id = self.id(index)?;
        self.broker
            .peer(id)
            .map(|peer| peer.snapshot())
            .ok_or_else(|| SimError::UnknownPeer(id.clone()))
    }

    pub fn broker(&self) -> &Broker<L> {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut Broker<L> {
        &mut self.broker
    }

    pub fn converged(&self) -> bool {
        self.assert_converged().is_ok()
    }

    /// Compare every peer's snapshot against peer 0.
    pub fn assert_converged(&self) -> Result<(), SimError> {
        let Some(reference) = self.ids.first() else {
            return Ok(());
        };
        let expected = self.snapshot(0)?;

        let divergent: Vec<PeerId> = self
            .broker
            .peers()
            .filter(|peer| peer.id() != reference && peer.snapshot() != expected)
            .map(|peer| peer.id().clone())
            .collect();

        if divergent.is_empty() {
            Ok(())
        } else {
            log::warn!("{} peers diverge from {reference}", divergent.len());
            Err(SimError::Diverged {
                reference: reference.clone(),
                divergent,
            })
        }
    }
}

impl Harness<TextDocument> {
    /// Edit a peer's text through a [`TextEditor`].
    pub fn edit<F>(&mut self, index: usize, f: F) -> Result<Option<BroadcastReport>, SimError>
    where
        F: FnOnce(&mut TextEditor<'_>),
    {
        self.edit_log(index, |doc: &mut TextDocument| doc.edit(f))
    }

    pub fn content(&self, index: usize) -> Result<String, SimError> {
        self.snapshot(index).map(|snapshot| snapshot.content)
    }

    /// Play a schedule step by step, stopping at the first error.
    pub fn run(&mut self, schedule: &[Step]) -> Result<(), SimError> {
        for step in schedule {
            log::debug!("Step {step:?}");
            match step {
                Step::Connect(index) => {
                    self.connect(*index)?;
                }
                Step::Disconnect(index) => self.disconnect(*index)?,
                Step::Insert { peer, index, text } => {
                    let (index, text) = (*index, text.as_str());
                    self.edit(*peer, |e| e.insert(index, text))?;
                }
                Step::Remove { peer, index, len } => {
                    let (index, len) = (*index, *len);
                    self.edit(*peer, |e| e.remove(index, len))?;
                }
            }
        }
        Ok(())
    }
}
