//! # Driven Ports (Outbound SPI)
//!
//! Collaborators the transport requires the host node to provide. None of
//! them are owned by the transport; all must tolerate concurrent calls
//! from many request handlers at once.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::entities::{Peer, PeerFilter, PeerState};
use shared_types::ledger::{Block, BlockVotes, CommonBlock, SignatureShare, Transaction};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{
    CodecError, DirectoryError, DispatchError, ExchangeError, Method, PayloadKind, PoolError,
    RequestBody, StoreError,
};

/// Peer registry.
///
/// Owns every peer record. The transport only reads peers to pick targets
/// and asks for updates, bans and removals.
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Peers matching `filter`, in the directory's selection order.
    async fn list(&self, filter: &PeerFilter) -> Result<Vec<Peer>, DirectoryError>;

    /// Insert or refresh a peer record.
    async fn update(&self, peer: Peer) -> Result<(), DirectoryError>;

    /// Drop a peer entirely.
    async fn remove(&self, ip: u32, port: u16) -> Result<(), DirectoryError>;

    /// Change a peer's state; `expiry_secs` bounds a ban.
    async fn set_state(
        &self,
        ip: u32,
        port: u16,
        state: PeerState,
        expiry_secs: u64,
    ) -> Result<(), DirectoryError>;
}

/// Persistent block queries.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Highest block with height in `[min, max]` whose id is in `ids`.
    async fn query_common_block(
        &self,
        ids: &[String],
        min: i64,
        max: i64,
    ) -> Result<Option<CommonBlock>, StoreError>;

    /// Up to `limit` blocks following `last_id`, with their joined data.
    async fn load_blocks(&self, last_id: Option<&str>, limit: usize)
        -> Result<Vec<Value>, StoreError>;

    /// Height of the local chain tip.
    async fn last_height(&self) -> u64;
}

/// Ledger object normalization and binary encoding.
pub trait LedgerCodec: Send + Sync {
    fn normalize_block(&self, raw: Value) -> Result<Block, CodecError>;

    fn normalize_votes(&self, raw: Value) -> Result<BlockVotes, CodecError>;

    fn normalize_transaction(&self, raw: Value) -> Result<Transaction, CodecError>;

    /// Decode the binary form of a `kind` object into JSON.
    fn decode(&self, kind: PayloadKind, bytes: &[u8]) -> Result<Value, CodecError>;

    /// Encode a `kind` object into its binary form.
    fn encode(&self, kind: PayloadKind, value: &Value) -> Result<Vec<u8>, CodecError>;
}

/// The unconfirmed transaction pool.
#[async_trait]
pub trait TransactionPool: Send + Sync {
    /// Snapshot of the unconfirmed transactions.
    async fn unconfirmed(&self) -> Vec<Transaction>;

    async fn has_unconfirmed(&self, transaction: &Transaction) -> bool;

    /// Full admission against ledger state.
    async fn receive_transactions(&self, transactions: Vec<Transaction>)
        -> Result<(), PoolError>;
}

/// Multisignature share processing.
#[async_trait]
pub trait MultisigProcessor: Send + Sync {
    async fn process_signature(&self, share: SignatureShare) -> Result<(), DispatchError>;
}

/// Application (dapp) handlers.
#[async_trait]
pub trait AppDispatcher: Send + Sync {
    /// Deliver a relayed message; the returned object is merged into the reply.
    async fn deliver_message(&self, dappid: &str, body: Value) -> Result<Value, DispatchError>;

    /// Serve a request/response call.
    async fn deliver_request(
        &self,
        dappid: &str,
        method: &str,
        path: &str,
        query: Value,
    ) -> Result<Value, DispatchError>;
}

/// One fully-resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Duration,
}

/// Response as seen on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names lower-cased.
    pub headers: HashMap<String, String>,
    /// JSON body, or the body text as a JSON string when it is not JSON.
    pub body: Value,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}

/// HTTP client performing single exchanges.
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, ExchangeError>;
}
