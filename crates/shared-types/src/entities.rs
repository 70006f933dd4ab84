//! # Networking Entities
//!
//! Peer identity records and the protocol header set carried on every
//! request and response between nodes.
//!
//! ## Clusters
//!
//! - **Identity**: `Peer`, `PeerState`, `PeerKey`
//! - **Selection**: `PeerFilter`
//! - **Protocol**: `ProtocolHeaders` and the header name constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use crate::errors::AddressError;

// =============================================================================
// PROTOCOL HEADERS
// =============================================================================

/// Header carrying the sender's operating system string.
pub const HEADER_OS: &str = "os";
/// Header carrying the sender's protocol version.
pub const HEADER_VERSION: &str = "version";
/// Header carrying the sender's listening port.
pub const HEADER_PORT: &str = "port";
/// Header carrying the sender's network identifier.
pub const HEADER_MAGIC: &str = "magic";
/// Header set by reverse proxies with the original client address.
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// The local node's protocol header set.
///
/// Built once at bind time and attached to every outbound request and
/// every inbound response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolHeaders {
    /// Operating system string advertised to peers (max 64 chars).
    pub os: String,
    /// Protocol version (max 11 chars). Peers only trust an exact match.
    pub version: String,
    /// Port this node accepts peer traffic on.
    pub port: u16,
    /// Logical network identifier (max 8 chars).
    pub magic: String,
}

impl ProtocolHeaders {
    /// Header name/value pairs in wire order.
    pub fn pairs(&self) -> [(&'static str, String); 4] {
        [
            (HEADER_OS, self.os.clone()),
            (HEADER_VERSION, self.version.clone()),
            (HEADER_PORT, self.port.to_string()),
            (HEADER_MAGIC, self.magic.clone()),
        ]
    }
}

// =============================================================================
// PEER IDENTITY
// =============================================================================

/// Registry state of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    /// Excluded from selection until the ban expires.
    Banned,
    /// Eligible for selection.
    Active,
}

/// Directory key of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerKey {
    pub ip: u32,
    pub port: u16,
}

impl PeerKey {
    pub fn new(ip: u32, port: u16) -> Self {
        Self { ip, port }
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ip_from_u32(self.ip), self.port)
    }
}

/// A remote node as known to the Peer Directory.
///
/// The transport never owns peer state; it reads these records to pick
/// targets and issues update/ban/remove requests against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// IPv4 address encoded as a big-endian integer.
    pub ip: u32,
    /// Listening port (1-65535 for registered peers).
    pub port: u16,
    /// Registry state.
    pub state: PeerState,
    /// Advertised operating system (untrusted beyond length).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Advertised protocol version (untrusted beyond length).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Application identifier, present only for dapp-layer traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dappid: Option<String>,
    /// Explicit `host:port` address. When set it wins over `(ip, port)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Peer {
    /// An active peer with no advertised metadata.
    pub fn new(ip: u32, port: u16) -> Self {
        Self {
            ip,
            port,
            state: PeerState::Active,
            os: None,
            version: None,
            dappid: None,
            address: None,
        }
    }

    /// A target addressed only by `host:port`.
    ///
    /// Such a target has no directory identity, so no reputation action
    /// can be recorded against it.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::new(0, 0)
        }
    }

    /// Directory key of this peer.
    pub fn key(&self) -> PeerKey {
        PeerKey::new(self.ip, self.port)
    }

    /// Whether this peer can be referenced in the Peer Directory.
    pub fn has_directory_identity(&self) -> bool {
        self.ip != 0 && self.port != 0
    }

    /// Base URL (`http://host:port`) used to reach this peer.
    pub fn base_url(&self) -> String {
        match &self.address {
            Some(address) => format!("http://{}", address),
            None => format!("http://{}:{}", ip_from_u32(self.ip), self.port),
        }
    }

    /// Human-readable `ip:port` used in log lines.
    pub fn describe(&self) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => self.key().to_string(),
        }
    }
}

// =============================================================================
// PEER SELECTION
// =============================================================================

/// Selection criteria handed to `PeerDirectory::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerFilter {
    /// Maximum number of peers to return.
    pub limit: Option<usize>,
    /// Only peers serving this application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dappid: Option<String>,
}

impl PeerFilter {
    /// Filter returning at most `limit` peers.
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            dappid: None,
        }
    }

    /// Filter restricted to peers serving `dappid`.
    pub fn for_dapp(dappid: impl Into<String>) -> Self {
        Self {
            limit: None,
            dappid: Some(dappid.into()),
        }
    }

    /// Same criteria with the limit overridden.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// ADDRESS ENCODING
// =============================================================================

/// Encode an IPv4 address as a big-endian integer.
pub fn ip_to_u32(ip: Ipv4Addr) -> u32 {
    u32::from(ip)
}

/// Decode a big-endian integer into an IPv4 address.
pub fn ip_from_u32(ip: u32) -> Ipv4Addr {
    Ipv4Addr::from(ip)
}

/// Integer-encode any address that has an IPv4 form.
///
/// IPv4-mapped IPv6 addresses (as reported by dual-stack listeners) are
/// unwrapped; native IPv6 addresses cannot be encoded.
pub fn encode_ip(ip: IpAddr) -> Result<u32, AddressError> {
    match ip {
        IpAddr::V4(v4) => Ok(ip_to_u32(v4)),
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(ip_to_u32)
            .ok_or(AddressError::NotIpv4(ip)),
    }
}
