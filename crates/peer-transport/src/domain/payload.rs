//! # Wire Payloads and Validation Contracts
//!
//! Blocks, votes, proposals and transactions travel either as base64 of
//! their binary encoding or as already-structured JSON. `WirePayload` makes
//! that choice explicit and is resolved once, at the boundary, into a JSON
//! value the Ledger Codec normalizes.
//!
//! The contracts below only check the shape the transport itself relies
//! on; structural and cryptographic validity belong to the codec and
//! consensus.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};
use shared_types::ledger::{BlockVotes, Propose, SignatureShare};
use std::collections::HashMap;

use super::errors::{CodecError, PayloadError};

/// Maximum length of a block id.
pub const MAX_ID_LEN: usize = 30;
/// Bounds on the number of signatures in a votes batch.
pub const MIN_VOTES: usize = 1;
pub const MAX_VOTES: usize = 101;
/// Byte lengths of hex-encoded keys and signatures.
pub const PUBLIC_KEY_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 64;

// =============================================================================
// TAGGED WIRE PAYLOADS
// =============================================================================

/// Ledger object kinds with a binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Block,
    Votes,
    Propose,
    Transaction,
}

impl PayloadKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Votes => "votes",
            Self::Propose => "propose",
            Self::Transaction => "transaction",
        }
    }
}

/// A ledger object as it appears in a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum WirePayload {
    /// Base64 of the object's binary encoding.
    Encoded(String),
    /// The object as JSON.
    Structured(Value),
}

impl WirePayload {
    /// Read `field` of a request body.
    pub fn from_field(body: &Value, field: &'static str) -> Result<Self, PayloadError> {
        match body.get(field) {
            None | Some(Value::Null) => Err(PayloadError::Missing(field)),
            Some(Value::String(encoded)) => Ok(Self::Encoded(encoded.clone())),
            Some(structured) => Ok(Self::Structured(structured.clone())),
        }
    }

    /// Resolve into JSON, decoding binary payloads with `decode`.
    pub fn resolve<F>(self, kind: PayloadKind, decode: F) -> Result<Value, PayloadError>
    where
        F: FnOnce(PayloadKind, &[u8]) -> Result<Value, CodecError>,
    {
        match self {
            Self::Structured(value) => Ok(value),
            Self::Encoded(encoded) => {
                let bytes = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| PayloadError::Base64(e.to_string()))?;
                Ok(decode(kind, &bytes)?)
            }
        }
    }

    /// Base64-encode binary bytes for the wire.
    pub fn encode(bytes: &[u8]) -> Self {
        Self::Encoded(BASE64.encode(bytes))
    }

    /// JSON form used inside request bodies.
    pub fn into_value(self) -> Value {
        match self {
            Self::Encoded(encoded) => Value::String(encoded),
            Self::Structured(value) => value,
        }
    }
}

// =============================================================================
// OUTBOUND BODIES
// =============================================================================

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Maps and arrays are sent as JSON.
    Json(Value),
    /// Anything else is sent verbatim.
    Raw(String),
}

impl RequestBody {
    /// Pick the encoding for `data` by its shape.
    pub fn from_data(data: Value) -> Option<Self> {
        match data {
            Value::Null => None,
            Value::Object(_) | Value::Array(_) => Some(Self::Json(data)),
            Value::String(text) => Some(Self::Raw(text)),
            other => Some(Self::Raw(other.to_string())),
        }
    }
}

// =============================================================================
// CONTRACTS
// =============================================================================

/// Accumulates schema violations for one object.
struct Contract<'a> {
    object: Option<&'a Map<String, Value>>,
    issues: Vec<String>,
}

impl<'a> Contract<'a> {
    fn new(value: &'a Value) -> Self {
        let object = value.as_object();
        let issues = if object.is_some() {
            Vec::new()
        } else {
            vec!["Expected type object".to_string()]
        };
        Self { object, issues }
    }

    fn field(&mut self, name: &str) -> Option<&'a Value> {
        let object = self.object?;
        let value = object.get(name);
        if value.is_none() {
            self.issues
                .push(format!("Missing required property: {}", name));
        }
        value
    }

    fn integer(&mut self, name: &str, minimum: Option<i64>) {
        let Some(value) = self.field(name) else { return };
        match value.as_i64() {
            None => self.issues.push(format!("{}: expected integer", name)),
            Some(n) if minimum.is_some_and(|min| n < min) => self
                .issues
                .push(format!("{}: value {} is less than minimum", name, n)),
            Some(_) => {}
        }
    }

    fn string(&mut self, name: &str, max_len: Option<usize>) -> Option<&'a str> {
        let value = self.field(name)?;
        let Some(text) = value.as_str() else {
            self.issues.push(format!("{}: expected string", name));
            return None;
        };
        if max_len.is_some_and(|max| text.chars().count() > max) {
            self.issues.push(format!("{}: string is too long", name));
            return None;
        }
        Some(text)
    }

    fn hex(&mut self, name: &str, bytes: Option<usize>) {
        let Some(text) = self.string(name, None) else { return };
        match (hex::decode(text), bytes) {
            (Err(_), _) => self.issues.push(format!("{}: expected hex string", name)),
            (Ok(decoded), Some(len)) if decoded.len() != len => self
                .issues
                .push(format!("{}: expected {} bytes", name, len)),
            _ => {}
        }
    }

    fn array(&mut self, name: &str, min: usize, max: usize) {
        let Some(value) = self.field(name) else { return };
        match value.as_array() {
            None => self.issues.push(format!("{}: expected array", name)),
            Some(items) if items.len() < min || items.len() > max => self.issues.push(format!(
                "{}: expected {}-{} items, got {}",
                name,
                min,
                max,
                items.len()
            )),
            Some(_) => {}
        }
    }

    fn finish(self) -> Result<(), PayloadError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(PayloadError::Schema(self.issues))
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, PayloadError> {
    serde_json::from_value(value.clone()).map_err(|e| PayloadError::Schema(vec![e.to_string()]))
}

/// `{height ≥ 1, id ≤ 30 chars, signatures: 1-101 entries}`.
pub fn validate_votes(value: &Value) -> Result<BlockVotes, PayloadError> {
    let mut contract = Contract::new(value);
    contract.integer("height", Some(1));
    contract.string("id", Some(MAX_ID_LEN));
    contract.array("signatures", MIN_VOTES, MAX_VOTES);
    contract.finish()?;
    parse(value)
}

/// Every proposal field is required; keys and signatures must be hex of
/// the right length.
pub fn validate_propose(value: &Value) -> Result<Propose, PayloadError> {
    let mut contract = Contract::new(value);
    contract.integer("height", Some(1));
    contract.string("id", Some(MAX_ID_LEN));
    contract.integer("timestamp", None);
    contract.hex("generatorPublicKey", Some(PUBLIC_KEY_BYTES));
    contract.string("address", None);
    contract.hex("hash", None);
    contract.hex("signature", Some(SIGNATURE_BYTES));
    contract.finish()?;
    parse(value)
}

/// `{signature: {transaction, signature}}`.
pub fn validate_signature_submission(body: &Value) -> Result<SignatureShare, PayloadError> {
    let mut outer = Contract::new(body);
    let inner = outer.field("signature");
    outer.finish()?;

    let inner = inner.unwrap_or(&Value::Null);
    let mut contract = Contract::new(inner);
    contract.string("transaction", None);
    contract.hex("signature", Some(SIGNATURE_BYTES));
    contract.finish()?;
    parse(inner)
}

// =============================================================================
// QUERY CONTRACTS
// =============================================================================

/// Parameters of the common-block lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonBlockQuery {
    pub max: i64,
    pub min: i64,
    pub ids: String,
}

impl CommonBlockQuery {
    /// `max` and `min` must be integers and `ids` present.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<String>> {
        let mut issues = Vec::new();
        let mut integer = |name: &str| match query.get(name) {
            None => {
                issues.push(format!("Missing required property: {}", name));
                None
            }
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    issues.push(format!("{}: expected integer", name));
                    None
                }
            },
        };
        let max = integer("max");
        let min = integer("min");
        let ids = query.get("ids").cloned();
        if ids.is_none() {
            issues.push("Missing required property: ids".to_string());
        }

        match (max, min, ids) {
            (Some(max), Some(min), Some(ids)) => Ok(Self { max, min, ids }),
            _ => Err(issues),
        }
    }

    /// Comma-separated ids that consist only of decimal digits.
    pub fn numeric_ids(&self) -> Vec<String> {
        self.ids
            .split(',')
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .map(str::to_string)
            .collect()
    }
}
