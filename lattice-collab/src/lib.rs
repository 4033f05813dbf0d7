//! # lattice-collab — In-process multi-peer collaboration simulator
//!
//! Simulates N editors sharing one document over an unreliable network,
//! without any real transport. Every peer owns a replica; the broker fans
//! updates out and holds them in per-peer offline queues while a peer is
//! disconnected.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────────────┐
//!   apply_local_edit │ Broker                   │ connect / disconnect
//!  ─────────────────►│  BTreeMap<PeerId, Peer>  │◄────────────────────
//!                    └───┬──────────┬──────────┬┘
//!               deliver  │          │          │
//!                ┌───────▼──┐ ┌─────▼────┐ ┌───▼──────┐
//!                │ Peer     │ │ Peer     │ │ Peer     │
//!                │ (online) │ │ (online) │ │ (offline)│
//!                └────┬─────┘ └────┬─────┘ └────┬─────┘
//!                     ▼            ▼            ▼
//!                  log.apply    log.apply   OfflineQueue
//! ```
//!
//! ## Modules
//!
//! - [`broker`] — Peer registry, N-1 fan-out, reconnect protocol
//! - [`peer`] — Per-peer log, queue, presence and lifecycle events
//! - [`queue`] — Unbounded offline queue
//! - [`awareness`] — Local presence state (not propagated)
//! - [`events`] — Named-event listener bus
//! - [`shared`] — Lock-protected broker for concurrent drivers
//! - [`harness`] — Index-addressed scenarios and convergence checks
//! - [`error`] — `SimError`

pub mod error;
pub mod events;
pub mod awareness;
pub mod queue;
pub mod peer;
pub mod broker;
pub mod shared;
pub mod harness;

// Re-exports for convenience
pub use error::SimError;
pub use events::{EventBus, Listener, ListenerId, SYNC_EVENT};
pub use awareness::{AwarenessChannel, AwarenessState, CursorColor, InertSubscription, TextCursor};
pub use queue::OfflineQueue;
pub use peer::{ConnectionState, Delivery, Peer, PeerStats};
pub use broker::{BroadcastReport, Broker, BrokerStats, ConnectOutcome};
pub use shared::SharedBroker;
pub use harness::{Harness, SimConfig, Step};
pub use lattice_core::{DocumentSnapshot, PeerId, ReplicatedLog, TextDocument, TextEditor, UpdateOrigin};
