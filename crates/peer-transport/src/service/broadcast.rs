//! # Broadcast Engine and Random-Peer Requester
//!
//! ```text
//! broadcast:    list(limit=20) ──→ dispatch ──→ [≤5 in flight] ──→ PeerClient × N ──→ completion task
//! request_any:  (list(limit=1) ──→ PeerClient) × up to 20, first success wins
//! ```

use std::sync::Arc;

use futures::future::join_all;
use shared_types::entities::{Peer, PeerFilter};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::PeerClient;
use crate::domain::{PeerResponse, RequestOptions, TransportError};
use crate::ports::outbound::PeerDirectory;

/// Fans requests out to a bounded set of peers.
#[derive(Clone)]
pub struct BroadcastEngine {
    client: PeerClient,
    directory: Arc<dyn PeerDirectory>,
    limit: usize,
    concurrency: usize,
}

impl BroadcastEngine {
    pub fn new(
        client: PeerClient,
        directory: Arc<dyn PeerDirectory>,
        limit: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            directory,
            limit,
            concurrency: concurrency.max(1),
        }
    }

    /// Send `options` to up to `limit` peers matching `filter`.
    ///
    /// Returns the targeted peers as soon as every send is dispatched.
    /// Per-peer outcomes are not reported: the client already applies
    /// reputation actions and logs each failure.
    pub async fn broadcast(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<Vec<Peer>, TransportError> {
        let peers = self.directory.list(&filter.with_limit(self.limit)).await?;
        self.dispatch(peers.clone(), options);
        Ok(peers)
    }

    /// Start one send per peer with at most `concurrency` in flight.
    ///
    /// The returned handle resolves once every send has finished. Must be
    /// called within a Tokio runtime.
    pub fn dispatch(&self, peers: Vec<Peer>, options: RequestOptions) -> JoinHandle<()> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let path = options.path();
        let options = Arc::new(options);
        let count = peers.len();

        let sends: Vec<_> = peers
            .into_iter()
            .map(|peer| {
                let permits = permits.clone();
                let client = self.client.clone();
                let options = options.clone();
                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire().await else {
                        return;
                    };
                    if let Err(e) = client.send(&peer, &options).await {
                        debug!(peer = %peer.describe(), error = %e, "Broadcast send failed");
                    }
                })
            })
            .collect();

        tokio::spawn(async move {
            for joined in join_all(sends).await {
                if let Err(e) = joined {
                    warn!(error = %e, "Broadcast task aborted");
                }
            }
            debug!(path = %path, peers = count, "Broadcast complete");
        })
    }
}

/// Retries single-peer requests against randomly selected peers.
#[derive(Clone)]
pub struct RandomPeerRequester {
    client: PeerClient,
    directory: Arc<dyn PeerDirectory>,
    attempts: usize,
}

impl RandomPeerRequester {
    pub fn new(client: PeerClient, directory: Arc<dyn PeerDirectory>, attempts: usize) -> Self {
        Self {
            client,
            directory,
            attempts: attempts.max(1),
        }
    }

    /// Ask one peer at a time until one answers or the attempts run out.
    pub async fn request_any(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<PeerResponse, TransportError> {
        let filter = filter.with_limit(1);
        let mut last = TransportError::NoPeers;

        for attempt in 1..=self.attempts {
            let outcome = match self.directory.list(&filter).await {
                Ok(peers) => match peers.into_iter().next() {
                    Some(peer) => self.client.send(&peer, &options).await,
                    None => Err(TransportError::NoPeers),
                },
                Err(e) => Err(e.into()),
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(e) => {
                    debug!(attempt, error = %e, "Random peer attempt failed");
                    last = e;
                }
            }
        }

        Err(TransportError::AllAttemptsFailed {
            attempts: self.attempts,
            last: last.to_string(),
        })
    }
}
