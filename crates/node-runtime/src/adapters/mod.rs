//! # Port Adapters
//!
//! In-process implementations of the transport's outbound ports. They
//! stand in for the ledger, the consensus-side codec and the dapp host.

pub mod codec;
pub mod dapps;
pub mod ledger;

pub use codec::JsonLedgerCodec;
pub use dapps::DappRegistry;
pub use ledger::InMemoryLedger;
