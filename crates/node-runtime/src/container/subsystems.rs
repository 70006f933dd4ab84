//! # Subsystem Container
//!
//! Holds the transport and every collaborator it is wired to.
//!
//! ## Wiring
//!
//! ```text
//!   InMemoryEventBus ◄── InMemoryLedger (pool + multisig republish)
//!         ▲
//!         │ consensus events
//!   PeerTransportService ──→ InMemoryPeerDirectory
//!         │                  InMemoryLedger (BlockStore, TransactionPool, MultisigProcessor)
//!         │                  JsonLedgerCodec
//!         │                  DappRegistry
//!         └──→ HttpExchange (reqwest)
//! ```
//!
//! ## Thread Safety
//!
//! Every component is shared through `Arc` and synchronizes internally.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use peer_transport::adapters::http::ReqwestExchange;
use peer_transport::adapters::InMemoryPeerDirectory;
use peer_transport::ports::outbound::HttpExchange;
use peer_transport::{PeerTransportService, TransportPorts};
use shared_bus::InMemoryEventBus;

use crate::adapters::{DappRegistry, InMemoryLedger, JsonLedgerCodec};
use crate::container::config::NodeConfig;

/// Central container holding the transport and its collaborators.
pub struct SubsystemContainer {
    /// The peer transport.
    pub transport: Arc<PeerTransportService>,

    /// Peer registry, seeded from configuration.
    pub directory: Arc<InMemoryPeerDirectory>,

    /// Chain and unconfirmed pool.
    pub ledger: Arc<InMemoryLedger>,

    /// Installed dapps.
    pub dapps: Arc<DappRegistry>,

    /// Consensus event bus.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
}

impl SubsystemContainer {
    /// Build the container with a reqwest exchange. Must be called within a
    /// Tokio runtime.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let exchange = ReqwestExchange::new().context("Failed to build HTTP client")?;
        Self::with_exchange(config, Arc::new(exchange))
    }

    /// Build the container around an explicit exchange.
    #[instrument(name = "container_init", skip_all)]
    pub fn with_exchange(config: NodeConfig, exchange: Arc<dyn HttpExchange>) -> Result<Self> {
        let event_bus = Arc::new(InMemoryEventBus::new());

        let seeds = config.seed_peers().context("Invalid seed peers")?;
        let directory = Arc::new(InMemoryPeerDirectory::with_peers(seeds));
        info!(peers = directory.len(), "Peer directory seeded");

        let ledger = Arc::new(InMemoryLedger::new(event_bus.clone()));
        let dapps = Arc::new(DappRegistry::new());

        let ports = TransportPorts {
            directory: directory.clone(),
            exchange,
            store: ledger.clone(),
            codec: Arc::new(JsonLedgerCodec::new()),
            pool: ledger.clone(),
            multisig: ledger.clone(),
            dapps: dapps.clone(),
            events: event_bus.clone(),
        };
        let transport = Arc::new(PeerTransportService::new(config.transport.clone(), ports));
        info!(
            magic = %config.transport.magic,
            version = %config.transport.version,
            "Peer transport initialized"
        );

        Ok(Self {
            transport,
            directory,
            ledger,
            dapps,
            event_bus,
            config,
        })
    }
}
