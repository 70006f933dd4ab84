//! JSON-backed ledger codec.
//!
//! The binary form of every ledger object is its UTF-8 JSON document.
//! Normalization goes through the typed records in `shared_types::ledger`.

use peer_transport::domain::{CodecError, PayloadKind};
use peer_transport::ports::outbound::LedgerCodec;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::ledger::{Block, BlockVotes, Transaction};

/// `LedgerCodec` whose binary encoding is plain JSON bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLedgerCodec;

impl JsonLedgerCodec {
    pub fn new() -> Self {
        Self
    }

    fn normalize<T: DeserializeOwned>(kind: &'static str, raw: Value) -> Result<T, CodecError> {
        serde_json::from_value(raw).map_err(|e| CodecError::Invalid {
            kind,
            reason: e.to_string(),
        })
    }

    fn require_id(kind: &'static str, id: &str) -> Result<(), CodecError> {
        if id.is_empty() {
            return Err(CodecError::Invalid {
                kind,
                reason: "empty id".to_string(),
            });
        }
        Ok(())
    }
}

impl LedgerCodec for JsonLedgerCodec {
    fn normalize_block(&self, raw: Value) -> Result<Block, CodecError> {
        let block: Block = Self::normalize("block", raw)?;
        Self::require_id("block", &block.id)?;
        Ok(block)
    }

    fn normalize_votes(&self, raw: Value) -> Result<BlockVotes, CodecError> {
        let votes: BlockVotes = Self::normalize("votes", raw)?;
        Self::require_id("votes", &votes.id)?;
        Ok(votes)
    }

    fn normalize_transaction(&self, raw: Value) -> Result<Transaction, CodecError> {
        let transaction: Transaction = Self::normalize("transaction", raw)?;
        Self::require_id("transaction", &transaction.id)?;
        Ok(transaction)
    }

    fn decode(&self, kind: PayloadKind, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            kind: kind.name(),
            reason: e.to_string(),
        })
    }

    fn encode(&self, kind: PayloadKind, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode {
            kind: kind.name(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binary_form_is_json() {
        let codec = JsonLedgerCodec::new();
        let block = json!({"id": "7", "height": 3});

        let bytes = codec.encode(PayloadKind::Block, &block).unwrap();
        assert_eq!(codec.decode(PayloadKind::Block, &bytes).unwrap(), block);
    }

    #[test]
    fn test_decode_garbage_names_kind() {
        let codec = JsonLedgerCodec::new();
        let error = codec.decode(PayloadKind::Votes, b"\x00\x01").unwrap_err();
        assert!(matches!(error, CodecError::Decode { kind: "votes", .. }));
    }

    #[test]
    fn test_normalize_rejects_empty_id() {
        let codec = JsonLedgerCodec::new();
        assert!(codec
            .normalize_transaction(json!({"id": "", "type": 0}))
            .is_err());
        assert!(codec.normalize_block(json!({"height": 3})).is_err());

        let tx = codec
            .normalize_transaction(json!({"id": "55", "amount": 10}))
            .unwrap();
        assert_eq!(tx.body["amount"], 10);
    }
}
