//! # Node Runtime Library
//!
//! Wires the peer transport to in-process collaborators and runs it. The
//! `transport-node` binary is a thin CLI over [`NodeRuntime`].
//!
//! ## Modules
//!
//! - `container/` - configuration and the subsystem container
//! - `adapters/` - ledger, codec and dapp registry behind the transport's ports
//! - `wiring/` - event bus routing to the propagation hooks
//! - `runtime` - startup and graceful shutdown

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod runtime;
pub mod wiring;

pub use container::{NodeConfig, SubsystemContainer};
pub use runtime::NodeRuntime;
