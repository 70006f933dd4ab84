//! # Shared Types Crate
//!
//! This crate contains the records exchanged between the peer transport,
//! the event bus and the node runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Peer and ledger wire records are defined once here.
//! - **Opaque Ledger Payloads**: Only the fields the transport reads are typed;
//!   everything else rides along untouched in a flattened JSON map.
//! - **Integer-Encoded Addresses**: Peers are keyed by `(ip: u32, port: u16)`,
//!   matching the Peer Directory's storage key.

pub mod entities;
pub mod errors;
pub mod ledger;

pub use entities::*;
pub use errors::*;
pub use ledger::*;
