//! Simulation errors.

use std::fmt;

use lattice_core::{LogError, PeerId};

/// Errors surfaced by the broker, peers and harness.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A peer with this id is already registered
    DuplicateId(PeerId),
    /// No peer with this id is registered
    UnknownPeer(PeerId),
    /// The receiving peer's log rejected an update
    ApplyConflict { peer: PeerId, source: LogError },
    /// Peers whose snapshot differs from the reference peer
    Diverged { reference: PeerId, divergent: Vec<PeerId> },
    /// Harness peer index out of range
    PeerIndex(usize),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "Peer id already registered: {id}"),
            Self::UnknownPeer(id) => write!(f, "Unknown peer: {id}"),
            Self::ApplyConflict { peer, source } => {
                write!(f, "Peer {peer} rejected update: {source}")
            }
            Self::Diverged { reference, divergent } => {
                let ids: Vec<&str> = divergent.iter().map(PeerId::as_str).collect();
                write!(f, "Peers [{}] diverge from {reference}", ids.join(", "))
            }
            Self::PeerIndex(index) => write!(f, "No peer at index {index}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ApplyConflict { source, .. } => Some(source),
            _ => None,
        }
    }
}
