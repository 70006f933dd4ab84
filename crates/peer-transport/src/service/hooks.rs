//! Lifecycle and propagation hooks.
//!
//! Each `on_*` hook is a no-op unless its `broadcast` flag is set, so the
//! node can forward every local event without deciding what to gossip.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::entities::{encode_ip, Peer, PeerFilter, ProtocolHeaders};
use shared_types::ledger::{Block, BlockVotes, DappMessage, Propose, SignatureShare, Transaction};
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use super::PeerTransportService;
use crate::domain::{
    fingerprint, CodecError, PayloadError, PayloadKind, PeerResponse, RequestOptions,
    TransportError, WirePayload,
};
use crate::ports::inbound::PeerTransportApi;

/// `body.peer` of a dapp request that names its target.
#[derive(Debug, Deserialize)]
struct PeerTarget {
    ip: String,
    port: u16,
}

impl PeerTarget {
    fn into_peer(self) -> Result<Peer, PayloadError> {
        let ip = self
            .ip
            .parse::<IpAddr>()
            .ok()
            .and_then(|ip| encode_ip(ip).ok())
            .ok_or_else(|| PayloadError::Schema(vec![format!("peer.ip: invalid {}", self.ip)]))?;
        Ok(Peer::new(ip, self.port))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Set `timestamp` and `hash` on an outgoing dapp message.
fn stamp(mut message: DappMessage) -> DappMessage {
    let timestamp = now_millis();
    message.hash = Some(fingerprint(&message.body, timestamp));
    message.timestamp = Some(timestamp);
    message
}

impl PeerTransportService {
    /// Binary-encode a ledger object for the wire.
    fn encode_field<T: Serialize>(&self, kind: PayloadKind, value: &T) -> Result<Value, TransportError> {
        let json = serde_json::to_value(value).map_err(|e| CodecError::Encode {
            kind: kind.name(),
            reason: e.to_string(),
        })?;
        let bytes = self.ports.codec.encode(kind, &json)?;
        Ok(WirePayload::encode(&bytes).into_value())
    }

    fn dapp_filter(message: &DappMessage) -> PeerFilter {
        PeerFilter {
            dappid: message.dappid.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerTransportApi for PeerTransportService {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    fn on_bind(&self, headers: ProtocolHeaders) {
        debug!(magic = %headers.magic, version = %headers.version, port = headers.port, "Headers bound");
        self.headers.set(headers);
    }

    fn on_blockchain_ready(&self) {
        self.ready.store(true, Ordering::Release);
        info!("Peer transport ready");
    }

    fn cleanup(&self) {
        self.ready.store(false, Ordering::Release);
        self.dedup.clear();
        info!("Peer transport stopped");
    }

    // =========================================================================
    // OUTBOUND PRIMITIVES
    // =========================================================================

    async fn broadcast(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<Vec<Peer>, TransportError> {
        self.broadcaster.broadcast(filter, options).await
    }

    async fn request_any(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<PeerResponse, TransportError> {
        self.requester.request_any(filter, options).await
    }

    async fn send(
        &self,
        peer: Peer,
        options: RequestOptions,
    ) -> Result<PeerResponse, TransportError> {
        self.client.send(&peer, &options).await
    }

    // =========================================================================
    // PROPAGATION HOOKS
    // =========================================================================

    async fn on_new_block(
        &self,
        block: Block,
        votes: BlockVotes,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError> {
        if !broadcast {
            return Ok(Vec::new());
        }
        let data = json!({
            "block": self.encode_field(PayloadKind::Block, &block)?,
            "votes": self.encode_field(PayloadKind::Votes, &votes)?,
        });
        self.broadcast(PeerFilter::default(), RequestOptions::post("/blocks", data))
            .await
    }

    async fn on_new_propose(
        &self,
        propose: Propose,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError> {
        if !broadcast {
            return Ok(Vec::new());
        }
        let data = json!({ "propose": self.encode_field(PayloadKind::Propose, &propose)? });
        self.broadcast(PeerFilter::default(), RequestOptions::post("/propose", data))
            .await
    }

    async fn on_unconfirmed_transaction(
        &self,
        transaction: Transaction,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError> {
        if !broadcast {
            return Ok(Vec::new());
        }
        let data = json!({
            "transaction": self.encode_field(PayloadKind::Transaction, &transaction)?,
        });
        self.broadcast(
            PeerFilter::default(),
            RequestOptions::post("/transactions", data),
        )
        .await
    }

    async fn on_signature(
        &self,
        signature: SignatureShare,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError> {
        if !broadcast {
            return Ok(Vec::new());
        }
        self.broadcast(
            PeerFilter::default(),
            RequestOptions::post("/signatures", json!({ "signature": signature })),
        )
        .await
    }

    async fn on_message(
        &self,
        message: DappMessage,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError> {
        if !broadcast {
            return Ok(Vec::new());
        }
        let filter = Self::dapp_filter(&message);
        let data = serde_json::to_value(&message)
            .map_err(|e| PayloadError::Schema(vec![e.to_string()]))?;
        self.broadcast(filter, RequestOptions::post("/dapp/message", data))
            .await
    }

    async fn send_votes(
        &self,
        votes: BlockVotes,
        address: String,
    ) -> Result<PeerResponse, TransportError> {
        let data = serde_json::to_value(&votes)
            .map_err(|e| PayloadError::Schema(vec![e.to_string()]))?;
        self.send(Peer::from_address(address), RequestOptions::post("/votes", data))
            .await
    }

    // =========================================================================
    // APPLICATION RELAY
    // =========================================================================

    async fn publish_message(&self, message: DappMessage) -> Result<DappMessage, TransportError> {
        let message = stamp(message);
        if let Some(hash) = message.hash.as_deref() {
            self.dedup.record(hash);
        }
        self.on_message(message.clone(), true).await?;
        Ok(message)
    }

    async fn request_dapp(&self, message: DappMessage) -> Result<PeerResponse, TransportError> {
        let message = stamp(message);
        let target = message.body.get("peer").cloned();
        let data = serde_json::to_value(&message)
            .map_err(|e| PayloadError::Schema(vec![e.to_string()]))?;
        let options = RequestOptions::post("/dapp/request", data);

        match target {
            Some(target) if !target.is_null() => {
                let peer = serde_json::from_value::<PeerTarget>(target)
                    .map_err(|e| PayloadError::Schema(vec![e.to_string()]))?
                    .into_peer()?;
                self.send(peer, options).await
            }
            _ => {
                self.request_any(Self::dapp_filter(&message), options)
                    .await
            }
        }
    }
}
