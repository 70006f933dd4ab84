//! # Node Configuration
//!
//! Transport settings plus the peers the directory is seeded with.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>` or `RELAY_CONFIG`)
//! 3. Environment: `RELAY_MAGIC`, `RELAY_VERSION`, `RELAY_PORT`, `RELAY_PEER_TIMEOUT_MS`

use peer_transport::domain::{ConfigError as TransportConfigError, TransportConfig};
use serde::{Deserialize, Serialize};
use shared_types::entities::{encode_ip, Peer};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Peer transport configuration.
    pub transport: TransportConfig,
    /// Peers the directory starts with.
    pub peers: Vec<SeedPeer>,
}

/// A configured peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPeer {
    pub ip: IpAddr,
    pub port: u16,
}

impl SeedPeer {
    pub fn to_peer(&self) -> Result<Peer, ConfigError> {
        let ip = encode_ip(self.ip).map_err(|_| ConfigError::InvalidSeed(self.ip.to_string()))?;
        if self.port == 0 {
            return Err(ConfigError::InvalidSeed(format!("{}:0", self.ip)));
        }
        Ok(Peer::new(ip, self.port))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid seed peer {0}: must be IPv4 with a non-zero port")]
    InvalidSeed(String),

    #[error(transparent)]
    Transport(#[from] TransportConfigError),
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load from an optional file, apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_toml(&text, path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RELAY_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(magic) = lookup("RELAY_MAGIC") {
            self.transport.magic = magic;
        }
        if let Some(version) = lookup("RELAY_VERSION") {
            self.transport.version = version;
        }
        if let Some(port) = lookup("RELAY_PORT") {
            self.transport.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "RELAY_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(timeout) = lookup("RELAY_PEER_TIMEOUT_MS") {
            self.transport.peer_timeout_ms =
                timeout.parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "RELAY_PEER_TIMEOUT_MS",
                    value: timeout.clone(),
                })?;
        }
        Ok(())
    }

    /// Validate transport settings and seed peers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate()?;
        for seed in &self.peers {
            seed.to_peer()?;
        }
        Ok(())
    }

    /// Seed peers as directory records.
    pub fn seed_peers(&self) -> Result<Vec<Peer>, ConfigError> {
        self.peers.iter().map(SeedPeer::to_peer).collect()
    }
}
