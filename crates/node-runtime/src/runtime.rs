//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Build the subsystem container (directory seeded from configuration)
//! 2. Install local headers with the port actually bound
//! 3. Start the event router
//! 4. Serve the peer gateway
//! 5. Signal blockchain ready
//!
//! Shutdown reverses it: stop serving peers, signal the tasks, join them.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use peer_transport::adapters::http;
use peer_transport::PeerTransportApi;

use crate::container::{NodeConfig, SubsystemContainer};
use crate::wiring::EventRouter;

/// The running node.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Create a runtime from configuration. Must be called within a Tokio runtime.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Ok(Self::with_container(SubsystemContainer::new(config)?))
    }

    pub fn with_container(container: SubsystemContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }

    /// Bind the configured gateway address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.container.config.transport.bind_addr();
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind peer gateway on {}", addr))
    }

    /// Start routing and serving on `listener`. Returns the bound address.
    pub async fn start(&self, listener: TcpListener) -> Result<SocketAddr> {
        let addr = listener
            .local_addr()
            .context("Failed to read gateway address")?;
        let transport = Arc::clone(&self.container.transport);

        let mut headers = self.container.config.transport.local_headers();
        headers.port = addr.port();
        transport.on_bind(headers);

        let router = EventRouter::new(
            transport.clone(),
            Arc::clone(&self.container.ledger),
            self.container.event_bus.clone(),
        );
        let subscription = self.container.event_bus.subscribe(EventRouter::filter());
        let routing = tokio::spawn(router.run(subscription, self.shutdown_rx.clone()));

        let mut shutdown = self.shutdown_rx.clone();
        let server_transport = transport.clone();
        let server = tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown.changed().await;
            };
            if let Err(e) = http::serve(server_transport, listener, signal).await {
                error!(error = %e, "Peer gateway failed");
            }
        });

        self.tasks.lock().extend([routing, server]);

        transport.on_blockchain_ready();
        info!(%addr, magic = %self.container.config.transport.magic, "Node is serving peers");
        Ok(addr)
    }

    /// Stop serving peers and wait for the background tasks.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.container.transport.cleanup();

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task panicked");
            }
        }
        info!("Shutdown complete");
    }
}
