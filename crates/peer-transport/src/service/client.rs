//! # Single-Peer Client
//!
//! Executes one request against one peer and turns the outcome into
//! reputation actions on the Peer Directory.

use std::sync::Arc;
use std::time::Duration;

use shared_types::entities::{Peer, PeerState};
use tracing::{debug, info, warn};

use super::LocalHeaders;
use crate::domain::{
    decide, validate_response_headers, Method, Observation, PeerResponse, RawHeaders,
    ReputationAction, RequestBody, RequestOptions, TransportError,
};
use crate::ports::outbound::{HttpExchange, OutboundRequest, PeerDirectory, RawResponse};

/// Sends requests to individual peers.
#[derive(Clone)]
pub struct PeerClient {
    exchange: Arc<dyn HttpExchange>,
    directory: Arc<dyn PeerDirectory>,
    headers: LocalHeaders,
    timeout: Duration,
}

impl PeerClient {
    pub fn new(
        exchange: Arc<dyn HttpExchange>,
        directory: Arc<dyn PeerDirectory>,
        headers: LocalHeaders,
        timeout: Duration,
    ) -> Self {
        Self {
            exchange,
            directory,
            headers,
            timeout,
        }
    }

    /// Send `options` to `peer`.
    ///
    /// Unreachable peers are removed; any other failure soft-bans the peer
    /// unless `options.not_ban` is set. A 200 response refreshes the peer's
    /// directory record from its advertised headers.
    pub async fn send(
        &self,
        peer: &Peer,
        options: &RequestOptions,
    ) -> Result<PeerResponse, TransportError> {
        let request = self.build(peer, options);
        let method = request.method;
        let url = request.url.clone();

        match self.exchange.execute(request).await {
            Err(error) => {
                debug!(url = %url, status = "unknown", error = %error, "Request failed");
                let action = decide(Observation::from_exchange(&error), options.not_ban);
                self.apply(peer, action, method, &url).await;
                Err(TransportError::Exchange {
                    peer: peer.describe(),
                    source: error,
                })
            }
            Ok(response) if response.status != 200 => {
                debug!(url = %url, status = response.status, "Request failed");
                let action = decide(Observation::Misbehaved, options.not_ban);
                self.apply(peer, action, method, &url).await;
                Err(TransportError::BadStatus {
                    peer: peer.describe(),
                    status: response.status,
                })
            }
            Ok(response) => {
                self.refresh(peer, &response).await;
                Ok(PeerResponse {
                    body: response.body,
                    peer: peer.clone(),
                })
            }
        }
    }

    fn build(&self, peer: &Peer, options: &RequestOptions) -> OutboundRequest {
        let mut headers: Vec<(String, String)> = self
            .headers
            .get()
            .pairs()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        for (name, value) in &options.headers {
            match headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1 = value.clone(),
                None => headers.push((name.clone(), value.clone())),
            }
        }

        OutboundRequest {
            url: options.url_for(peer),
            method: options.method,
            headers,
            body: RequestBody::from_data(options.data.clone()),
            timeout: self.timeout,
        }
    }

    async fn apply(&self, peer: &Peer, action: ReputationAction, method: Method, url: &str) {
        if !peer.has_directory_identity() {
            return;
        }

        match action {
            ReputationAction::Remove => match self.directory.remove(peer.ip, peer.port).await {
                Ok(()) => info!(peer = %peer.describe(), "Removing peer {} {}", method, url),
                Err(e) => warn!(peer = %peer.describe(), error = %e, "Failed to remove peer"),
            },
            ReputationAction::Ban { secs } => {
                match self
                    .directory
                    .set_state(peer.ip, peer.port, PeerState::Banned, secs)
                    .await
                {
                    Ok(()) => info!(
                        peer = %peer.describe(),
                        "Ban {} min {} {}",
                        secs / 60,
                        method,
                        url
                    ),
                    Err(e) => warn!(peer = %peer.describe(), error = %e, "Failed to ban peer"),
                }
            }
            ReputationAction::Keep => {}
        }
    }

    async fn refresh(&self, peer: &Peer, response: &RawResponse) {
        let raw = RawHeaders::from_lookup(|name| response.header(name));
        let advertised = match validate_response_headers(&raw) {
            Ok(advertised) => advertised,
            Err(issues) => {
                debug!(peer = %peer.describe(), issues = ?issues, "Ignoring invalid response headers");
                return;
            }
        };

        if peer.ip == 0 || advertised.version != self.headers.get().version {
            return;
        }

        let refreshed = Peer {
            os: advertised.os,
            version: Some(advertised.version),
            ..Peer::new(peer.ip, advertised.port)
        };
        if let Err(e) = self.directory.update(refreshed).await {
            warn!(peer = %peer.describe(), error = %e, "Failed to refresh peer");
        }
    }
}
