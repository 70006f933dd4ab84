//! # Ledger Wire Records
//!
//! The transport treats ledger objects as opaque: normalization and
//! validation belong to the Ledger Codec. These records type only the
//! fields the transport reads (ids, heights, signature lists) and carry
//! the rest in a flattened map so nothing is lost on re-broadcast.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub height: u64,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// A batch of validator signatures endorsing one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVotes {
    pub height: u64,
    pub id: String,
    pub signatures: Vec<Value>,
}

/// A candidate block announced by its generator before it is voted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Propose {
    pub height: u64,
    pub id: String,
    pub timestamp: u64,
    pub generator_public_key: String,
    pub address: String,
    pub hash: String,
    pub signature: String,
}

/// A normalized transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Multisignature shares collected so far.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// One multisignature share for a pending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShare {
    /// Id of the transaction being co-signed.
    pub transaction: String,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Signatures collected for one unconfirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignatures {
    pub transaction: String,
    pub signatures: Vec<String>,
}

/// Highest block shared between two chains, as answered by the Block Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonBlock {
    pub height: u64,
    pub id: String,
    #[serde(default)]
    pub previous_block: Option<String>,
    pub timestamp: u64,
}

/// An opaque application-layer payload relayed on behalf of a dapp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DappMessage {
    #[serde(default)]
    pub dappid: Option<String>,
    /// Milliseconds since the Unix epoch, stamped by the originator.
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Decimal fingerprint of `body` and `timestamp`.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl DappMessage {
    pub fn new(dappid: impl Into<String>, body: Value) -> Self {
        Self {
            dappid: Some(dappid.into()),
            timestamp: None,
            hash: None,
            body,
        }
    }

    /// `body.method` of a dapp request.
    pub fn method(&self) -> Option<&str> {
        self.body.get("method").and_then(Value::as_str)
    }

    /// `body.path` of a dapp request.
    pub fn path(&self) -> Option<&str> {
        self.body.get("path").and_then(Value::as_str)
    }

    /// `body.query` of a dapp request.
    pub fn query(&self) -> Value {
        self.body.get("query").cloned().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_keeps_unknown_fields() {
        let raw = json!({"id": "123", "height": 7, "generatorPublicKey": "ab", "totalFee": 10});
        let block: Block = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(block.height, 7);
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_common_block_camel_case() {
        let common = CommonBlock {
            height: 10,
            id: "99".into(),
            previous_block: Some("98".into()),
            timestamp: 1000,
        };
        let value = serde_json::to_value(&common).unwrap();
        assert_eq!(value["previousBlock"], "98");
    }

    #[test]
    fn test_dapp_request_accessors() {
        let msg = DappMessage::new(
            "dapp-1",
            json!({"method": "get", "path": "/balance", "query": {"a": 1}}),
        );
        assert_eq!(msg.method(), Some("get"));
        assert_eq!(msg.path(), Some("/balance"));
        assert_eq!(msg.query(), json!({"a": 1}));
    }
}
