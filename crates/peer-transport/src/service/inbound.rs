//! # Inbound Gateway
//!
//! Admission checks run before every endpoint, then one handler per
//! endpoint. Handlers are transport-agnostic: they take parsed inputs and
//! return the JSON reply; the HTTP adapter only moves bytes.
//!
//! Endpoint failures are replies (`{success: false, error}`), never
//! errors: a peer sees a generic answer and the node keeps serving.

use serde_json::{json, Map, Value};
use shared_bus::TransportEvent;
use shared_types::entities::{encode_ip, ip_from_u32, Peer, PeerFilter, PeerState};
use shared_types::ledger::{Block, BlockVotes, DappMessage, Transaction, TransactionSignatures};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

use super::PeerTransportService;
use crate::domain::{
    decide, failure, fingerprint_matches, success, validate_propose, validate_request_headers,
    validate_signature_submission, validate_votes, CommonBlockQuery, DispatchError,
    GatewayRejection, Observation, PayloadError, PayloadKind, RawHeaders, ReputationAction,
    TransportError, WirePayload,
};

/// Connection-level facts about one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMeta {
    /// `x-forwarded-for` header.
    pub forwarded_for: Option<String>,
    /// Socket peer address.
    pub remote: Option<IpAddr>,
    pub headers: RawHeaders,
    /// `dappid` of the request body, when present.
    pub dappid: Option<String>,
}

/// The admitted sender of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Address as reported (forwarded-for or socket).
    pub address: String,
    /// Integer form of `address` when it is IPv4.
    pub ip: Option<u32>,
    /// Advertised listening port, when valid.
    pub port: Option<u16>,
    port_label: String,
}

impl Caller {
    /// `ip:port` for log lines.
    pub fn describe(&self) -> String {
        format!("{}:{}", self.address, self.port_label)
    }

    /// Directory key, when the caller can be referenced in the directory.
    pub fn directory_key(&self) -> Option<(u32, u16)> {
        Some((self.ip?, self.port?))
    }
}

impl PeerTransportService {
    // =========================================================================
    // ADMISSION
    // =========================================================================

    /// Run the gateway checks and register the caller when it qualifies.
    pub async fn admit(&self, meta: &InboundMeta) -> Result<Caller, GatewayRejection> {
        if !self.is_ready() {
            return Err(GatewayRejection::NotReady);
        }

        let address = meta
            .forwarded_for
            .as_deref()
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|forwarded| !forwarded.is_empty())
            .map(str::to_string)
            .or_else(|| meta.remote.map(|ip| ip.to_string()))
            .ok_or(GatewayRejection::WrongHeaderData)?;

        let headers =
            validate_request_headers(&meta.headers).map_err(GatewayRejection::InvalidHeaders)?;

        let local = self.headers.get();
        if headers.magic != local.magic {
            return Err(GatewayRejection::WrongNetwork {
                expected: local.magic,
                received: headers.magic,
            });
        }

        let caller = Caller {
            ip: address
                .parse::<IpAddr>()
                .ok()
                .and_then(|ip| encode_ip(ip).ok()),
            port: headers.port,
            port_label: meta.headers.port_label(),
            address,
        };

        if caller.ip.is_some_and(|ip| ip_from_u32(ip).is_loopback()) {
            return Ok(caller);
        }

        match caller.directory_key() {
            Some((ip, port)) if headers.version == local.version => {
                let peer = Peer {
                    os: headers.os,
                    version: Some(headers.version),
                    dappid: meta.dappid.clone(),
                    ..Peer::new(ip, port)
                };
                if let Err(e) = self.ports.directory.update(peer).await {
                    warn!(peer = %caller.describe(), error = %e, "Failed to register peer");
                }
            }
            _ => debug!(peer = %caller.describe(), "Caller not registered"),
        }

        Ok(caller)
    }

    /// Ban a caller for sending an unusable payload.
    async fn penalize(&self, caller: &Caller, observation: Observation) {
        let Some((ip, port)) = caller.directory_key() else {
            return;
        };
        if let ReputationAction::Ban { secs } = decide(observation, false) {
            if let Err(e) = self
                .ports
                .directory
                .set_state(ip, port, PeerState::Banned, secs)
                .await
            {
                warn!(peer = %caller.describe(), error = %e, "Failed to ban peer");
            }
        }
    }

    async fn emit(&self, event: TransportEvent) {
        let name = event.name();
        let receivers = self.ports.events.publish(event).await;
        debug!(event = name, receivers, "Event emitted");
    }

    fn resolve_field(
        &self,
        body: &Value,
        field: &'static str,
        kind: PayloadKind,
    ) -> Result<Value, PayloadError> {
        let codec = &self.ports.codec;
        WirePayload::from_field(body, field)?.resolve(kind, |kind, bytes| codec.decode(kind, bytes))
    }

    // =========================================================================
    // PEERS
    // =========================================================================

    /// `GET /list`
    pub async fn list_peers(&self) -> Value {
        let filter = PeerFilter::limited(self.config.peer_list_limit);
        let peers = self.ports.directory.list(&filter).await.unwrap_or_else(|e| {
            warn!(error = %e, "Peer listing failed");
            Vec::new()
        });
        json!({ "peers": peers })
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// `GET /blocks/common`
    pub async fn common_block(&self, caller: &Caller, query: &HashMap<String, String>) -> Value {
        let query = match CommonBlockQuery::parse(query) {
            Ok(query) => query,
            Err(issues) => return failure(issues),
        };

        let ids = query.numeric_ids();
        if ids.is_empty() {
            warn!(peer = %caller.describe(), "Invalid common block request, ban 60 min");
            self.penalize(caller, Observation::MalformedPayload).await;
            return failure("Invalid block id sequence");
        }

        match self
            .ports
            .store
            .query_common_block(&ids, query.min, query.max)
            .await
        {
            Ok(common) => json!({ "success": true, "common": common }),
            Err(e) => {
                error!(error = %e, "Common block lookup failed");
                failure("Database error")
            }
        }
    }

    /// `GET /blocks`
    pub async fn blocks(&self, last_block_id: Option<&str>) -> Value {
        match self
            .ports
            .store
            .load_blocks(last_block_id, self.config.blocks_sync_limit)
            .await
        {
            Ok(blocks) => json!({ "blocks": blocks }),
            Err(e) => {
                warn!(error = %e, "Loading blocks failed");
                json!({ "blocks": [] })
            }
        }
    }

    fn decode_block_submission(&self, body: &Value) -> Result<(Block, BlockVotes), TransportError> {
        let codec = &self.ports.codec;
        let block = codec.normalize_block(self.resolve_field(body, "block", PayloadKind::Block)?)?;
        let votes = codec.normalize_votes(self.resolve_field(body, "votes", PayloadKind::Votes)?)?;
        Ok((block, votes))
    }

    /// `POST /blocks`
    pub async fn receive_block(&self, caller: &Caller, body: &Value) -> Value {
        match self.decode_block_submission(body) {
            Ok((block, votes)) => {
                debug!(block = %block.id, height = block.height, "Received block");
                self.emit(TransportEvent::ReceiveBlock { block, votes }).await;
            }
            Err(e) => {
                warn!(
                    peer = %caller.describe(),
                    error = %e,
                    "Block is not valid, ban 60 min"
                );
                self.penalize(caller, Observation::MalformedPayload).await;
            }
        }
        success()
    }

    /// `POST /votes`
    pub async fn receive_votes(&self, body: &Value) -> Value {
        match validate_votes(body) {
            Ok(votes) => {
                self.emit(TransportEvent::ReceiveVotes(votes)).await;
                success()
            }
            Err(e) => {
                debug!(error = %e, "Rejected votes");
                failure("Schema validation error")
            }
        }
    }

    /// `POST /propose`
    pub async fn receive_propose(&self, body: &Value) -> Value {
        let propose = self
            .resolve_field(body, "propose", PayloadKind::Propose)
            .and_then(|raw| validate_propose(&raw));
        match propose {
            Ok(propose) => {
                self.emit(TransportEvent::ReceivePropose(propose)).await;
                success()
            }
            Err(e) => {
                debug!(error = %e, "Rejected propose");
                failure("Schema validation error")
            }
        }
    }

    // =========================================================================
    // SIGNATURES & TRANSACTIONS
    // =========================================================================

    /// `POST /signatures`
    pub async fn receive_signature(&self, body: &Value) -> Value {
        let share = match validate_signature_submission(body) {
            Ok(share) => share,
            Err(e) => {
                debug!(error = %e, "Rejected signature");
                return failure("Validation error");
            }
        };

        match self.ports.multisig.process_signature(share).await {
            Ok(()) => success(),
            Err(e) => {
                debug!(error = %e, "Signature processing failed");
                failure("Process signature error")
            }
        }
    }

    /// `GET /signatures`
    pub async fn signatures(&self) -> Value {
        let signatures: Vec<TransactionSignatures> = self
            .ports
            .pool
            .unconfirmed()
            .await
            .into_iter()
            .filter(|tx| !tx.signatures.is_empty())
            .map(|tx| TransactionSignatures {
                transaction: tx.id,
                signatures: tx.signatures,
            })
            .collect();
        json!({ "success": true, "signatures": signatures })
    }

    /// `GET /transactions`
    pub async fn transactions(&self) -> Value {
        json!({ "transactions": self.ports.pool.unconfirmed().await })
    }

    fn decode_transaction(&self, body: &Value) -> Result<Transaction, TransportError> {
        let raw = self.resolve_field(body, "transaction", PayloadKind::Transaction)?;
        Ok(self.ports.codec.normalize_transaction(raw)?)
    }

    /// `POST /transactions`
    pub async fn receive_transaction(&self, caller: &Caller, body: &Value) -> Value {
        let transaction = match self.decode_transaction(body) {
            Ok(transaction) => transaction,
            Err(e) => {
                error!(error = %e, "Transaction parse error");
                warn!(
                    peer = %caller.describe(),
                    "Received transaction is not valid, ban 60 min"
                );
                self.penalize(caller, Observation::MalformedPayload).await;
                return failure("Invalid transaction body");
            }
        };

        match self.admit_transaction(transaction, caller.describe()).await {
            Ok(()) => success(),
            Err(e) => {
                error!(error = %e, "Transaction admission failed");
                failure(e.to_string())
            }
        }
    }

    /// Admit a transaction through the sequencer.
    ///
    /// Transactions already in the unconfirmed pool are accepted as no-ops.
    pub async fn admit_transaction(
        &self,
        transaction: Transaction,
        origin: String,
    ) -> Result<(), TransportError> {
        let pool = self.ports.pool.clone();
        self.sequencer
            .add(async move {
                if pool.has_unconfirmed(&transaction).await {
                    return Ok(());
                }
                info!(transaction = %transaction.id, peer = %origin, "Received transaction");
                pool.receive_transactions(vec![transaction])
                    .await
                    .map_err(TransportError::from)
            })
            .await?
    }

    /// `GET /height`
    pub async fn height(&self) -> Value {
        json!({ "height": self.ports.store.last_height().await })
    }

    // =========================================================================
    // DAPP RELAY
    // =========================================================================

    /// `POST /dapp/message`
    pub async fn dapp_message(&self, body: &Value) -> Value {
        let (message, dappid, hash) = match check_dapp_envelope(body) {
            Ok(checked) => checked,
            Err(reply) => return reply,
        };

        if !self.dedup.check_and_record(&hash) {
            debug!(dappid = %dappid, hash = %hash, "Dapp message already relayed");
            return success();
        }

        let delivered = self
            .ports
            .dapps
            .deliver_message(&dappid, message.body.clone())
            .await;
        match application_outcome(delivered) {
            Ok(reply) => {
                self.emit(TransportEvent::Message {
                    message,
                    broadcast: true,
                })
                .await;
                merge_success(reply)
            }
            Err(e) => {
                warn!(dappid = %dappid, error = %e, "Dapp message failed");
                failure(e.to_string())
            }
        }
    }

    /// `POST /dapp/request`
    pub async fn dapp_request(&self, body: &Value) -> Value {
        let (message, dappid, _) = match check_dapp_envelope(body) {
            Ok(checked) => checked,
            Err(reply) => return reply,
        };

        let answered = self
            .ports
            .dapps
            .deliver_request(
                &dappid,
                message.method().unwrap_or_default(),
                message.path().unwrap_or_default(),
                message.query(),
            )
            .await;
        match application_outcome(answered) {
            Ok(reply) => merge_success(reply),
            Err(e) => {
                warn!(dappid = %dappid, error = %e, "Dapp request failed");
                failure(e.to_string())
            }
        }
    }
}

/// Check `dappid`, `timestamp` and `hash`, and that the hash is the body's
/// fingerprint. Returns the message, its dapp id and its hash.
fn check_dapp_envelope(body: &Value) -> Result<(DappMessage, String, String), Value> {
    let message: DappMessage =
        serde_json::from_value(body.clone()).map_err(|e| failure(e.to_string()))?;

    let dappid = match message.dappid.as_deref() {
        Some(dappid) if !dappid.is_empty() => dappid.to_string(),
        _ => return Err(failure("missed dappid")),
    };
    let (timestamp, hash) = match (message.timestamp, message.hash.as_deref()) {
        (Some(timestamp), Some(hash)) if timestamp != 0 && !hash.is_empty() => {
            (timestamp, hash.to_string())
        }
        _ => return Err(failure("missed hash sum")),
    };
    if !fingerprint_matches(&message.body, timestamp, &hash) {
        return Err(failure("wrong hash sum"));
    }

    Ok((message, dappid, hash))
}

/// A dapp reply carrying a truthy `error` field counts as a failure.
fn application_outcome(result: Result<Value, DispatchError>) -> Result<Value, DispatchError> {
    let reply = result?;
    match reply.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(reply),
        Some(Value::String(message)) => Err(DispatchError(message.clone())),
        Some(other) => Err(DispatchError(other.to_string())),
    }
}

fn merge_success(reply: Value) -> Value {
    let mut object = match reply {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    object.insert("success".to_string(), Value::Bool(true));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::fingerprint;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use shared_types::entities::ip_to_u32;
    use std::net::Ipv4Addr;
    use std::sync::atomic::Ordering;

    fn meta(forwarded: &str, magic: &str, version: &str, port: &str) -> InboundMeta {
        let headers = headers(magic, version, port);
        InboundMeta {
            forwarded_for: Some(forwarded.to_string()),
            remote: None,
            headers: RawHeaders::from_lookup(|name| headers.get(name).cloned()),
            dappid: None,
        }
    }

    fn caller() -> Caller {
        Caller {
            address: "10.0.0.5".into(),
            ip: Some(ip_to_u32(Ipv4Addr::new(10, 0, 0, 5))),
            port: Some(7000),
            port_label: "7000".into(),
        }
    }

    fn ban(ip: u32, port: u16, secs: u64) -> DirectoryCall {
        DirectoryCall::SetState(ip, port, PeerState::Banned, secs)
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    #[tokio::test]
    async fn test_not_ready_rejects_everything() {
        let h = harness();
        h.service.ready.store(false, Ordering::Release);

        let result = h.service.admit(&meta("10.0.0.5", "mainnet1", "1.0.0", "7000")).await;
        assert_eq!(result, Err(GatewayRejection::NotReady));
    }

    #[tokio::test]
    async fn test_missing_address_is_wrong_header_data() {
        let h = harness();
        let mut m = meta("", "mainnet1", "1.0.0", "7000");
        m.forwarded_for = None;

        assert_eq!(h.service.admit(&m).await, Err(GatewayRejection::WrongHeaderData));
    }

    #[tokio::test]
    async fn test_wrong_magic_rejected_without_registration() {
        let h = harness();

        let result = h.service.admit(&meta("10.0.0.5", "wrongnet", "1.0.0", "7000")).await;

        assert_eq!(
            result,
            Err(GatewayRejection::WrongNetwork {
                expected: "mainnet1".into(),
                received: "wrongnet".into(),
            })
        );
        assert!(h.directory.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_headers_list_issues() {
        let h = harness();
        let result = h.service.admit(&meta("10.0.0.5", "toolongmagic", "1.0.0", "7000")).await;
        assert!(matches!(result, Err(GatewayRejection::InvalidHeaders(issues)) if issues.len() == 1));
    }

    #[tokio::test]
    async fn test_matching_caller_is_registered() {
        let h = harness();
        let mut m = meta("10.0.0.5, 172.16.0.1", "mainnet1", "1.0.0", "7000");
        m.dappid = Some("dapp-7".into());

        let caller = h.service.admit(&m).await.unwrap();

        assert_eq!(caller.describe(), "10.0.0.5:7000");
        let calls = h.directory.calls.lock();
        match &calls[..] {
            [DirectoryCall::Update(peer)] => {
                assert_eq!(peer.ip, ip_to_u32(Ipv4Addr::new(10, 0, 0, 5)));
                assert_eq!(peer.port, 7000);
                assert_eq!(peer.state, PeerState::Active);
                assert_eq!(peer.dappid.as_deref(), Some("dapp-7"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_version_mismatch_or_bad_port_not_registered() {
        let h = harness();
        h.service.admit(&meta("10.0.0.5", "mainnet1", "0.9.0", "7000")).await.unwrap();
        h.service.admit(&meta("10.0.0.5", "mainnet1", "1.0.0", "0")).await.unwrap();
        h.service.admit(&meta("10.0.0.5", "mainnet1", "1.0.0", "70000")).await.unwrap();
        assert!(h.directory.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_loopback_skips_registration() {
        let h = harness();
        let mut m = meta("", "mainnet1", "1.0.0", "7000");
        m.forwarded_for = None;
        m.remote = Some("127.0.0.1".parse().unwrap());

        let caller = h.service.admit(&m).await.unwrap();
        assert_eq!(caller.address, "127.0.0.1");
        assert!(h.directory.calls.lock().is_empty());
    }

    // =========================================================================
    // ENDPOINTS
    // =========================================================================

    #[tokio::test]
    async fn test_list_peers_swallows_directory_errors() {
        let h = harness_with(
            MockDirectory {
                fail_list: true,
                ..Default::default()
            },
            MockStore::default(),
            MockPool::default(),
        );
        assert_eq!(h.service.list_peers().await, json!({"peers": []}));
        assert_eq!(h.directory.filters.lock()[0].limit, Some(100));
    }

    #[tokio::test]
    async fn test_common_block_filters_ids() {
        let h = harness();
        let query: HashMap<String, String> = [("max", "10"), ("min", "1"), ("ids", "abc,123")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let reply = h.service.common_block(&caller(), &query).await;

        assert_eq!(reply["success"], true);
        assert_eq!(reply["common"]["id"], "123");
        assert!(h.directory.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_common_block_invalid_ids_bans_hour() {
        let h = harness();
        let query: HashMap<String, String> = [("max", "10"), ("min", "1"), ("ids", "abc,def")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let reply = h.service.common_block(&caller(), &query).await;

        assert_eq!(
            reply,
            json!({"success": false, "error": "Invalid block id sequence"})
        );
        assert_eq!(
            *h.directory.calls.lock(),
            vec![ban(caller().ip.unwrap(), 7000, 3600)]
        );
    }

    #[tokio::test]
    async fn test_common_block_database_error() {
        let h = harness_with(
            MockDirectory::default(),
            MockStore { fail: true },
            MockPool::default(),
        );
        let query: HashMap<String, String> = [("max", "10"), ("min", "1"), ("ids", "5")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let reply = h.service.common_block(&caller(), &query).await;
        assert_eq!(reply, json!({"success": false, "error": "Database error"}));
    }

    #[tokio::test]
    async fn test_blocks_degrade_to_empty() {
        let h = harness();
        assert_eq!(h.service.blocks(None).await["blocks"][0]["limit"], 1440);

        let failing = harness_with(
            MockDirectory::default(),
            MockStore { fail: true },
            MockPool::default(),
        );
        assert_eq!(failing.service.blocks(Some("9")).await, json!({"blocks": []}));
    }

    #[tokio::test]
    async fn test_receive_block_emits_event() {
        let h = harness();
        let block = json!({"id": "9", "height": 4});
        let votes = json!({"height": 4, "id": "9", "signatures": []});
        let body = json!({
            "block": BASE64.encode(block.to_string()),
            "votes": votes,
        });

        let reply = h.service.receive_block(&caller(), &body).await;

        assert_eq!(reply, success());
        let events = h.events.events.lock();
        assert!(matches!(
            &events[..],
            [TransportEvent::ReceiveBlock { block, .. }] if block.id == "9"
        ));
        assert!(h.directory.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_block_bans_hour_without_event() {
        let h = harness();
        let body = json!({"block": {"height": "not a number"}, "votes": {}});

        let reply = h.service.receive_block(&caller(), &body).await;

        assert_eq!(reply, success());
        assert!(h.events.events.lock().is_empty());
        assert_eq!(
            *h.directory.calls.lock(),
            vec![ban(caller().ip.unwrap(), 7000, 3600)]
        );
    }

    #[tokio::test]
    async fn test_receive_votes() {
        let h = harness();
        let ok = h
            .service
            .receive_votes(&json!({"height": 2, "id": "5", "signatures": ["a"]}))
            .await;
        assert_eq!(ok, success());

        let bad = h
            .service
            .receive_votes(&json!({"height": 0, "id": "5", "signatures": ["a"]}))
            .await;
        assert_eq!(bad["error"], "Schema validation error");
        assert_eq!(h.events.events.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_receive_propose_encoded() {
        let h = harness();
        let propose = json!({
            "height": 3,
            "id": "11",
            "timestamp": 100,
            "generatorPublicKey": "ab".repeat(32),
            "address": "10.0.0.5:7000",
            "hash": "00ff",
            "signature": "cd".repeat(64),
        });
        let body = json!({"propose": BASE64.encode(propose.to_string())});

        assert_eq!(h.service.receive_propose(&body).await, success());
        assert!(matches!(
            &h.events.events.lock()[..],
            [TransportEvent::ReceivePropose(p)] if p.height == 3
        ));

        let reply = h.service.receive_propose(&json!({"propose": {"height": 3}})).await;
        assert_eq!(reply["error"], "Schema validation error");
    }

    #[tokio::test]
    async fn test_receive_signature() {
        let h = harness();
        let body = json!({"signature": {"transaction": "42", "signature": "ef".repeat(64)}});

        assert_eq!(h.service.receive_signature(&body).await, success());
        assert_eq!(h.multisig.processed.lock().len(), 1);

        let reply = h.service.receive_signature(&json!({"signature": {}})).await;
        assert_eq!(reply["error"], "Validation error");
    }

    #[tokio::test]
    async fn test_signature_listing_skips_unsigned() {
        let pool = MockPool::default();
        pool.pending.lock().push(Transaction {
            id: "1".into(),
            signatures: vec!["aa".into()],
            body: Map::new(),
        });
        pool.pending.lock().push(Transaction {
            id: "2".into(),
            signatures: vec![],
            body: Map::new(),
        });
        let h = harness_with(MockDirectory::default(), MockStore::default(), pool);

        let reply = h.service.signatures().await;
        assert_eq!(
            reply,
            json!({"success": true, "signatures": [{"transaction": "1", "signatures": ["aa"]}]})
        );
        assert_eq!(h.service.transactions().await["transactions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receive_transaction_admits_once() {
        let h = harness();
        let body = json!({"transaction": {"id": "tx1", "amount": 5}});

        assert_eq!(h.service.receive_transaction(&caller(), &body).await, success());
        assert_eq!(h.service.receive_transaction(&caller(), &body).await, success());
        assert_eq!(*h.pool.received.lock(), vec!["tx1".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_transaction_bans_hour() {
        let h = harness();
        let reply = h
            .service
            .receive_transaction(&caller(), &json!({"transaction": "%%%"}))
            .await;

        assert_eq!(reply, json!({"success": false, "error": "Invalid transaction body"}));
        assert_eq!(
            *h.directory.calls.lock(),
            vec![ban(caller().ip.unwrap(), 7000, 3600)]
        );
    }

    #[tokio::test]
    async fn test_rejected_transaction_reports_pool_error() {
        let h = harness_with(
            MockDirectory::default(),
            MockStore::default(),
            MockPool {
                reject: true,
                ..Default::default()
            },
        );
        let reply = h
            .service
            .receive_transaction(&caller(), &json!({"transaction": {"id": "tx9"}}))
            .await;
        assert_eq!(
            reply,
            json!({"success": false, "error": "Account does not have enough LSK"})
        );
    }

    #[tokio::test]
    async fn test_height() {
        let h = harness();
        assert_eq!(h.service.height().await, json!({"height": 77}));
    }

    // =========================================================================
    // DAPP RELAY
    // =========================================================================

    fn dapp_body(dappid: &str, body: Value, timestamp: u64) -> Value {
        json!({
            "dappid": dappid,
            "timestamp": timestamp,
            "hash": fingerprint(&body, timestamp),
            "body": body,
        })
    }

    #[tokio::test]
    async fn test_dapp_message_envelope_checks() {
        let h = harness();
        assert_eq!(
            h.service.dapp_message(&json!({"body": {}})).await["error"],
            "missed dappid"
        );
        assert_eq!(
            h.service.dapp_message(&json!({"dappid": "d", "body": {}})).await["error"],
            "missed hash sum"
        );
        let mut tampered = dapp_body("d", json!({"x": 1}), 10);
        tampered["body"] = json!({"x": 2});
        assert_eq!(h.service.dapp_message(&tampered).await["error"], "wrong hash sum");
    }

    #[tokio::test]
    async fn test_dapp_message_delivered_once_and_relayed() {
        let h = harness();
        *h.dapps.reply.lock() = Some(json!({"accepted": 1}));
        let body = dapp_body("dapp-1", json!({"call": "ping"}), 1_700_000_000_000);

        let first = h.service.dapp_message(&body).await;
        let second = h.service.dapp_message(&body).await;

        assert_eq!(first, json!({"accepted": 1, "success": true}));
        assert_eq!(second, success());
        assert_eq!(h.dapps.messages.lock().len(), 1);
        assert!(matches!(
            &h.events.events.lock()[..],
            [TransportEvent::Message { broadcast: true, .. }]
        ));
    }

    #[tokio::test]
    async fn test_dapp_message_error_field_is_failure() {
        let h = harness();
        *h.dapps.reply.lock() = Some(json!({"error": "bad call"}));

        let reply = h
            .service
            .dapp_message(&dapp_body("dapp-1", json!({"call": "x"}), 5))
            .await;

        assert_eq!(reply, json!({"success": false, "error": "bad call"}));
        assert!(h.events.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dapp_request_is_not_deduplicated() {
        let h = harness();
        let body = dapp_body("dapp-1", json!({"method": "get", "path": "/x", "query": {}}), 5);

        let first = h.service.dapp_request(&body).await;
        let second = h.service.dapp_request(&body).await;

        assert_eq!(first["path"], "/x");
        assert_eq!(first["success"], true);
        assert_eq!(first, second);
        assert!(h.service.dedup().is_empty());

        let missing = h
            .service
            .dapp_request(&dapp_body("missing", json!({"method": "get"}), 5))
            .await;
        assert_eq!(missing["error"], "Dapp not found");
    }
}
