//! # Peer Transport
//!
//! Node-to-node transport layer: admits inbound peer requests, serves the
//! `/peer` endpoints, and gossips locally produced ledger objects to other
//! nodes while keeping peer reputation in the Peer Directory.
//!
//! ## Architecture Role
//!
//! ```text
//!                 ┌──────────────────────── Peer Transport ────────────────────────┐
//!  remote peer ──→│ gateway ──→ admit ──→ handlers ──→ EventPublisher ─────────────┼──→ consensus
//!                 │                           │                                    │
//!                 │                           ├──→ Sequencer ──→ TransactionPool ──┼──→ ledger
//!                 │                           └──→ DedupCache ──→ AppDispatcher ───┼──→ dapps
//!                 │                                                                │
//!  node events ──→│ hooks ──→ BroadcastEngine ──→ PeerClient ──→ HttpExchange ─────┼──→ remote peers
//!                 │                                   └──→ PeerDirectory (ban/remove)
//!                 └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reputation
//!
//! - Unreachable peers (timeout, refused) are removed from the directory
//! - Any other failed exchange bans the peer for 10 minutes unless exempt
//! - Malformed inbound payloads ban the sender for 60 minutes

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::inbound::PeerTransportApi;
pub use ports::outbound::{
    AppDispatcher, BlockStore, HttpExchange, LedgerCodec, MultisigProcessor, OutboundRequest,
    PeerDirectory, RawResponse, TransactionPool,
};
pub use service::{
    BroadcastEngine, Caller, InboundMeta, LocalHeaders, PeerClient, PeerTransportService,
    RandomPeerRequester, Sequencer, TransportPorts,
};
