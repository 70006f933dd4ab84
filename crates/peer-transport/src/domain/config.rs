//! Transport configuration with validation.

use serde::{Deserialize, Serialize};
use shared_types::entities::ProtocolHeaders;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Ban applied to a peer after a failed outbound request (10 minutes).
pub const SOFT_BAN_SECS: u64 = 600;

/// Ban applied to a peer that sent a malformed or malicious payload (60 minutes).
pub const HARD_BAN_SECS: u64 = 3600;

/// Maximum length of the `os` header.
pub const MAX_OS_LEN: usize = 64;
/// Maximum length of the `magic` header.
pub const MAX_MAGIC_LEN: usize = 8;
/// Maximum length of the `version` header.
pub const MAX_VERSION_LEN: usize = 11;

/// Namespace every peer endpoint lives under.
pub const PEER_API_PREFIX: &str = "/peer";

/// Peer transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Logical network identifier.
    pub magic: String,
    /// Protocol version peers must match exactly to be registered.
    pub version: String,
    /// Operating system string advertised to peers.
    pub os: String,
    /// Port the gateway listens on and advertises.
    pub port: u16,
    /// Interface the gateway binds to.
    pub bind_host: IpAddr,
    /// Timeout applied to every outbound request.
    pub peer_timeout_ms: u64,
    /// Peers selected per broadcast.
    pub broadcast_limit: usize,
    /// Simultaneous in-flight requests per broadcast.
    pub broadcast_concurrency: usize,
    /// Attempts made by the random-peer requester.
    pub random_peer_attempts: usize,
    /// Peers returned by the list endpoint.
    pub peer_list_limit: usize,
    /// Blocks returned per bulk fetch.
    pub blocks_sync_limit: usize,
    /// Dapp message fingerprints remembered before the oldest are evicted.
    pub dedup_capacity: usize,
    /// Transactions that may wait for admission before enqueue blocks.
    pub sequencer_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            magic: "594fe0f3".to_string(),
            version: "0.1.0".to_string(),
            os: default_os(),
            port: 7040,
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            peer_timeout_ms: 4000,
            broadcast_limit: 20,
            broadcast_concurrency: 5,
            random_peer_attempts: 20,
            peer_list_limit: 100,
            blocks_sync_limit: 1440,
            dedup_capacity: 100_000,
            sequencer_capacity: 1024,
        }
    }
}

impl TransportConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.magic.is_empty() || self.magic.len() > MAX_MAGIC_LEN {
            return Err(ConfigError::InvalidMagic(self.magic.clone()));
        }

        if self.version.is_empty() || self.version.len() > MAX_VERSION_LEN {
            return Err(ConfigError::InvalidVersion(self.version.clone()));
        }

        if self.os.len() > MAX_OS_LEN {
            return Err(ConfigError::InvalidOs(self.os.len()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.peer_timeout_ms == 0 {
            return Err(ConfigError::InvalidLimit("peer_timeout_ms cannot be 0".into()));
        }

        let limits = [
            ("broadcast_limit", self.broadcast_limit),
            ("broadcast_concurrency", self.broadcast_concurrency),
            ("random_peer_attempts", self.random_peer_attempts),
            ("peer_list_limit", self.peer_list_limit),
            ("blocks_sync_limit", self.blocks_sync_limit),
            ("dedup_capacity", self.dedup_capacity),
            ("sequencer_capacity", self.sequencer_capacity),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidLimit(format!("{} cannot be 0", name)));
        }

        Ok(())
    }

    /// Outbound request timeout.
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    /// Gateway bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }

    /// Protocol headers this node advertises.
    pub fn local_headers(&self) -> ProtocolHeaders {
        ProtocolHeaders {
            os: self.os.clone(),
            version: self.version.clone(),
            port: self.port,
            magic: self.magic.clone(),
        }
    }
}

fn default_os() -> String {
    let mut os = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);
    os.truncate(MAX_OS_LEN);
    os
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Magic is empty or longer than 8 characters.
    #[error("invalid magic {0:?}: must be 1-8 characters")]
    InvalidMagic(String),
    /// Version is empty or longer than 11 characters.
    #[error("invalid version {0:?}: must be 1-11 characters")]
    InvalidVersion(String),
    /// OS string longer than 64 characters.
    #[error("invalid os: {0} characters exceeds 64")]
    InvalidOs(usize),
    /// Port 0 cannot be advertised.
    #[error("invalid port: must be 1-65535")]
    InvalidPort,
    /// Zero-valued limit or timeout.
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}
