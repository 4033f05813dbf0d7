//! The replicated log seam.
//!
//! A `ReplicatedLog` is an opaque, causally consistent CRDT container. The
//! simulator only ever talks to it through four capabilities: produce a
//! full-state update, apply a remote update, merge updates, and snapshot.
//! Local edits are log-specific and hand their delta back to the caller.
//!
//! Every mutation is tagged with an [`UpdateOrigin`] so that causality is
//! explicit instead of relying on object identity.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identity of a simulated peer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where a log mutation came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOrigin {
    /// Edit made by the local user of this replica.
    LocalEdit,
    /// Update received from the network. Carries the peer that broadcast it,
    /// or the receiving peer itself when replaying its offline queue.
    RemoteApply(PeerId),
}

impl UpdateOrigin {
    /// Local edits are the only changes that get rebroadcast as deltas.
    pub fn is_local(&self) -> bool {
        matches!(self, UpdateOrigin::LocalEdit)
    }
}

/// Errors raised by a replicated log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Update bytes could not be decoded
    Decode(String),
    /// Decoded update was rejected by the CRDT
    Apply(String),
    /// Updates could not be merged into one
    Merge(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Decode(e) => write!(f, "Update decode failed: {e}"),
            LogError::Apply(e) => write!(f, "Update rejected: {e}"),
            LogError::Merge(e) => write!(f, "Update merge failed: {e}"),
        }
    }
}

impl std::error::Error for LogError {}

/// Capabilities the simulator consumes from a CRDT container.
pub trait ReplicatedLog {
    /// Comparable view of the replica's state.
    type Snapshot: Clone + PartialEq + fmt::Debug;

    /// Create an empty replica. `replica_id` must be unique per network.
    fn new_replica(replica_id: u64) -> Self
    where
        Self: Sized;

    /// Full-state update covering everything this replica knows.
    fn local_update(&self) -> Vec<u8>;

    /// Apply a remote update.
    fn apply(&mut self, update: &[u8], origin: &UpdateOrigin) -> Result<(), LogError>;

    /// Merge several updates into one. Order-insensitive.
    fn merge(&self, updates: &[Vec<u8>]) -> Result<Vec<u8>, LogError>;

    fn snapshot(&self) -> Self::Snapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_display_and_borrow() {
        let id = PeerId::from("peer0");
        assert_eq!(id.to_string(), "peer0");
        assert_eq!(id.as_str(), "peer0");

        let mut ids = std::collections::BTreeSet::new();
        ids.insert(id.clone());
        assert!(ids.contains("peer0"));
    }

    #[test]
    fn test_origin_is_local() {
        assert!(UpdateOrigin::LocalEdit.is_local());
        assert!(!UpdateOrigin::RemoteApply(PeerId::from("peer1")).is_local());
    }

    #[test]
    fn test_log_error_display() {
        let err = LogError::Decode("unexpected end of buffer".into());
        assert_eq!(err.to_string(), "Update decode failed: unexpected end of buffer");
    }
}
