//! # Ledger Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Nodes talking over loopback HTTP
//!     ├── harness.rs    # TestNode: a full runtime on an ephemeral port
//!     ├── gossip.rs     # Blocks and transactions between nodes
//!     ├── reputation.rs # Removal and bans driven by real failures
//!     └── dapps.rs      # Dapp message relay and requests
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::reputation
//! ```

pub mod integration;
