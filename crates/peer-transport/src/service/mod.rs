//! # Peer Transport Service
//!
//! Wires the domain policies to the collaborator ports.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP gateway ──→ admit() ──→ endpoint handler ──┬──→ EventPublisher (consensus)
//!                                                   ├──→ Sequencer ──→ TransactionPool
//!                                                   └──→ DedupCache ──→ AppDispatcher
//!
//!   hooks ──→ BroadcastEngine / RandomPeerRequester ──→ PeerClient ──→ HttpExchange
//!                                                            └──→ PeerDirectory (reputation)
//! ```

mod broadcast;
mod client;
mod hooks;
mod inbound;
mod sequencer;

pub use broadcast::{BroadcastEngine, RandomPeerRequester};
pub use client::PeerClient;
pub use inbound::{Caller, InboundMeta};
pub use sequencer::Sequencer;

use parking_lot::RwLock;
use shared_bus::EventPublisher;
use shared_types::entities::ProtocolHeaders;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::{DedupCache, TransportConfig};
use crate::ports::outbound::{
    AppDispatcher, BlockStore, HttpExchange, LedgerCodec, MultisigProcessor, PeerDirectory,
    TransactionPool,
};

/// The protocol headers this node advertises, replaceable at bind time.
#[derive(Clone)]
pub struct LocalHeaders(Arc<RwLock<ProtocolHeaders>>);

impl LocalHeaders {
    pub fn new(headers: ProtocolHeaders) -> Self {
        Self(Arc::new(RwLock::new(headers)))
    }

    pub fn get(&self) -> ProtocolHeaders {
        self.0.read().clone()
    }

    pub fn set(&self, headers: ProtocolHeaders) {
        *self.0.write() = headers;
    }
}

/// Collaborators the transport is wired to.
#[derive(Clone)]
pub struct TransportPorts {
    pub directory: Arc<dyn PeerDirectory>,
    pub exchange: Arc<dyn HttpExchange>,
    pub store: Arc<dyn BlockStore>,
    pub codec: Arc<dyn LedgerCodec>,
    pub pool: Arc<dyn TransactionPool>,
    pub multisig: Arc<dyn MultisigProcessor>,
    pub dapps: Arc<dyn AppDispatcher>,
    pub events: Arc<dyn EventPublisher>,
}

/// Peer transport: inbound gateway logic plus outbound propagation.
pub struct PeerTransportService {
    config: TransportConfig,
    ports: TransportPorts,
    headers: LocalHeaders,
    ready: AtomicBool,
    dedup: DedupCache,
    sequencer: Sequencer,
    broadcaster: BroadcastEngine,
    requester: RandomPeerRequester,
    client: PeerClient,
}

impl PeerTransportService {
    /// Create the service. Must be called within a Tokio runtime.
    ///
    /// Local headers start from `config`; the node is not ready until
    /// `on_blockchain_ready` is called.
    pub fn new(config: TransportConfig, ports: TransportPorts) -> Self {
        let headers = LocalHeaders::new(config.local_headers());
        let client = PeerClient::new(
            ports.exchange.clone(),
            ports.directory.clone(),
            headers.clone(),
            config.peer_timeout(),
        );
        let broadcaster = BroadcastEngine::new(
            client.clone(),
            ports.directory.clone(),
            config.broadcast_limit,
            config.broadcast_concurrency,
        );
        let requester = RandomPeerRequester::new(
            client.clone(),
            ports.directory.clone(),
            config.random_peer_attempts,
        );

        Self {
            dedup: DedupCache::new(config.dedup_capacity),
            sequencer: Sequencer::spawn(config.sequencer_capacity),
            ready: AtomicBool::new(false),
            headers,
            broadcaster,
            requester,
            client,
            ports,
            config,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Whether inbound requests are being served.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Headers attached to every request and response.
    pub fn local_headers(&self) -> ProtocolHeaders {
        self.headers.get()
    }

    /// Fingerprints of relayed dapp messages.
    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }
}
