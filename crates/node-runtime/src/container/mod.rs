//! # Subsystem Container
//!
//! Configuration loading and the container that owns the transport and
//! its collaborators.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, SeedPeer};
pub use subsystems::SubsystemContainer;
