//! Adapters implementing the outbound ports and serving the inbound API.
//!
//! - **directory**: in-memory `PeerDirectory` with timed bans
//! - **http** (feature `http`): axum gateway and reqwest exchange

pub mod directory;

#[cfg(feature = "http")]
pub mod http;

pub use directory::InMemoryPeerDirectory;
