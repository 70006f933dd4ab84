//! # Event Routing
//!
//! Connects the event bus to the transport's propagation hooks and applies
//! received blocks to the local ledger.
//!
//! ## Event Flow
//!
//! ```text
//!   Propagation topic                          Consensus topic
//!   ─────────────────                          ───────────────
//!   NewBlock ──────────────→ on_new_block       ReceiveBlock ──→ ledger.apply_block
//!   NewPropose ────────────→ on_new_propose                          │ applied
//!   UnconfirmedTransaction → on_unconfirmed_transaction              ▼
//!   SignatureCreated ──────→ on_signature              NewBlock { broadcast: true }
//!   Message (broadcast) ───→ on_message
//! ```
//!
//! Every hook failure is logged and swallowed: one failed relay never stops
//! the router.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use peer_transport::{PeerTransportApi, TransportError};
use shared_bus::{EventFilter, EventPublisher, EventTopic, Subscription, TransportEvent};
use shared_types::entities::Peer;

use crate::adapters::InMemoryLedger;

/// Routes bus events to the transport and ledger.
pub struct EventRouter {
    transport: Arc<dyn PeerTransportApi>,
    ledger: Arc<InMemoryLedger>,
    events: Arc<dyn EventPublisher>,
}

impl EventRouter {
    pub fn new(
        transport: Arc<dyn PeerTransportApi>,
        ledger: Arc<InMemoryLedger>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            transport,
            ledger,
            events,
        }
    }

    /// Topics this router consumes.
    pub fn filter() -> EventFilter {
        EventFilter::topics(vec![EventTopic::Propagation, EventTopic::Consensus])
    }

    /// Consume `subscription` until the bus closes or `shutdown` flips.
    pub async fn run(self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("Event router started");
        loop {
            tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => self.route(event).await,
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        info!("Event router stopped");
    }

    /// Handle one event.
    pub async fn route(&self, event: TransportEvent) {
        let name = event.name();
        let outcome = match event {
            TransportEvent::NewBlock {
                block,
                votes,
                broadcast,
            } => self.transport.on_new_block(block, votes, broadcast).await,
            TransportEvent::NewPropose { propose, broadcast } => {
                self.transport.on_new_propose(propose, broadcast).await
            }
            TransportEvent::UnconfirmedTransaction {
                transaction,
                broadcast,
            } => {
                self.transport
                    .on_unconfirmed_transaction(transaction, broadcast)
                    .await
            }
            TransportEvent::SignatureCreated {
                signature,
                broadcast,
            } => self.transport.on_signature(signature, broadcast).await,
            TransportEvent::Message { message, broadcast } => {
                self.transport.on_message(message, broadcast).await
            }
            TransportEvent::ReceiveBlock { block, votes } => {
                if self.ledger.apply_block(block.clone()) {
                    self.events
                        .publish(TransportEvent::NewBlock {
                            block,
                            votes,
                            broadcast: true,
                        })
                        .await;
                }
                Ok(Vec::new())
            }
            TransportEvent::ReceiveVotes(votes) => {
                debug!(block = %votes.id, height = votes.height, "Votes received");
                Ok(Vec::new())
            }
            TransportEvent::ReceivePropose(propose) => {
                debug!(block = %propose.id, height = propose.height, "Propose received");
                Ok(Vec::new())
            }
        };

        log_outcome(name, outcome);
    }
}

fn log_outcome(event: &'static str, outcome: Result<Vec<Peer>, TransportError>) {
    match outcome {
        Ok(peers) if !peers.is_empty() => {
            debug!(event, peers = peers.len(), "Relayed to peers");
        }
        Ok(_) => {}
        Err(e) => warn!(event, error = %e, "Relay failed"),
    }
}
