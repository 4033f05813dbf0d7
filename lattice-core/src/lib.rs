//! # lattice-core — Replicated document state for the Lattice simulator
//!
//! Defines the seam between the network simulation and the CRDT that
//! actually stores document state.
//!
//! ```text
//! ┌──────────────────┐  local_update / apply / merge / snapshot
//! │ lattice-collab   │ ─────────────────────────────────────────┐
//! │ (Broker, Peer)   │                                          ▼
//! └──────────────────┘                              ┌──────────────────────┐
//!                                                   │ ReplicatedLog (trait)│
//!                                                   └──────────┬───────────┘
//!                                                              │ impl
//!                                                   ┌──────────▼───────────┐
//!                                                   │ TextDocument (Yrs)   │
//!                                                   └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`replica`] — `ReplicatedLog` trait, `UpdateOrigin`, `PeerId`, `LogError`
//! - [`document`] — Yrs-backed text document and its editor

pub mod replica;
pub mod document;

pub use replica::{LogError, PeerId, ReplicatedLog, UpdateOrigin};
pub use document::{DocumentSnapshot, TextDocument, TextEditor};
