//! # Wiring
//!
//! The node has no consensus engine of its own beyond the in-memory ledger,
//! so wiring is a single router: bus events in, transport hooks and ledger
//! updates out. See `event_routing` for the flow.

pub mod event_routing;

pub use event_routing::EventRouter;
