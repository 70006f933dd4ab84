//! Error types for the peer transport.
//!
//! Collaborator ports each carry their own error so adapters stay
//! independent; `TransportError` is what the service layer surfaces.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::headers::HeaderIssue;

// =============================================================================
// NETWORK CLASSIFICATION
// =============================================================================

/// Failure of one outbound HTTP exchange, classified for reputation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Connection could not be established in time.
    #[error("connection timed out: {0}")]
    Timeout(String),
    /// Connection established but the response did not arrive in time.
    #[error("socket timed out: {0}")]
    SocketTimeout(String),
    /// The peer actively refused the connection.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    /// Anything else (DNS, TLS, reset, malformed response).
    #[error("request failed: {0}")]
    Other(String),
}

impl ExchangeError {
    /// Whether this is one of the network-level classes that evict the peer.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::SocketTimeout(_) | Self::ConnectionRefused(_)
        )
    }
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Peer Directory failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("peer directory unavailable: {0}")]
    Unavailable(String),
    #[error("peer {0} not found")]
    NotFound(String),
}

/// Block Store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block store error: {0}")]
pub struct StoreError(pub String);

/// Ledger Codec failure (decode or normalization).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("cannot decode {kind}: {reason}")]
    Decode { kind: &'static str, reason: String },
    #[error("cannot encode {kind}: {reason}")]
    Encode { kind: &'static str, reason: String },
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

/// Unconfirmed pool admission failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PoolError(pub String);

/// Failure reported by the multisignature processor or a dapp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DispatchError(pub String);

// =============================================================================
// PAYLOAD & SEQUENCING
// =============================================================================

/// Inbound wire payload could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("schema violations: {}", .0.join("; "))]
    Schema(Vec<String>),
}

/// Transaction admission sequencer failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("sequencer is shut down")]
    Closed,
    #[error("sequenced task was dropped before completing")]
    Dropped,
}

// =============================================================================
// SERVICE ERROR
// =============================================================================

/// Errors surfaced by transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("request to {peer} failed: {source}")]
    Exchange {
        peer: String,
        #[source]
        source: ExchangeError,
    },

    #[error("request status code {status} from {peer}")]
    BadStatus { peer: String, status: u16 },

    #[error("No peers in db")]
    NoPeers,

    #[error("all {attempts} attempts failed, last error: {last}")]
    AllAttemptsFailed { attempts: usize, last: String },

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

// =============================================================================
// GATEWAY REJECTIONS
// =============================================================================

/// Reasons the inbound gateway refuses a request before endpoint logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayRejection {
    #[error("Blockchain is loading")]
    NotReady,

    #[error("Wrong header data")]
    WrongHeaderData,

    #[error("invalid protocol headers")]
    InvalidHeaders(Vec<HeaderIssue>),

    #[error("Request is made on the wrong network")]
    WrongNetwork { expected: String, received: String },

    #[error("API endpoint not found")]
    NotFound,
}

impl GatewayRejection {
    /// JSON body sent back to the caller.
    pub fn body(&self) -> Value {
        match self {
            Self::InvalidHeaders(issues) => json!({"success": false, "error": issues}),
            Self::WrongNetwork { expected, received } => json!({
                "success": false,
                "error": self.to_string(),
                "expected": expected,
                "received": received,
            }),
            other => failure(other.to_string()),
        }
    }
}

/// `{success: false, error}` reply body.
pub fn failure(error: impl Serialize) -> Value {
    json!({"success": false, "error": error})
}

/// `{success: true}` reply body.
pub fn success() -> Value {
    json!({"success": true})
}
