//! Message fingerprints for relayed dapp payloads.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fingerprint of a dapp payload stamped at `timestamp`.
///
/// SHA-256 over the compact JSON of `body` followed by the decimal
/// timestamp. The first 8 digest bytes, reversed, are read as an unsigned
/// big-endian integer and rendered in decimal. The leading digest bytes are
/// used, so fingerprints agree with peers already on the network.
pub fn fingerprint(body: &Value, timestamp: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.to_string().as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    for (i, byte) in head.iter_mut().enumerate() {
        *byte = digest[7 - i];
    }
    u64::from_be_bytes(head).to_string()
}

/// Whether `hash` is the fingerprint of `body` at `timestamp`.
pub fn matches(body: &Value, timestamp: u64, hash: &str) -> bool {
    fingerprint(body, timestamp) == hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let body = json!({"call": "transfer", "amount": 10});
        assert_eq!(fingerprint(&body, 1_700_000_000_000), fingerprint(&body, 1_700_000_000_000));
    }

    #[test]
    fn test_fingerprint_depends_on_timestamp_and_body() {
        let body = json!({"call": "transfer"});
        assert_ne!(fingerprint(&body, 1), fingerprint(&body, 2));
        assert_ne!(fingerprint(&body, 1), fingerprint(&json!({"call": "other"}), 1));
    }

    #[test]
    fn test_fingerprint_is_little_endian_head_of_digest() {
        let body = json!("payload");
        let digest = Sha256::digest(format!("{}{}", body, 42).as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        assert_eq!(fingerprint(&body, 42), u64::from_le_bytes(head).to_string());
    }

    #[test]
    fn test_matches() {
        let body = json!([1, 2, 3]);
        let hash = fingerprint(&body, 99);
        assert!(matches(&body, 99, &hash));
        assert!(!matches(&body, 100, &hash));
    }
}
