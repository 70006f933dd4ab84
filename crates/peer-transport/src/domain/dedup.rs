//! Dedup cache for relayed dapp message fingerprints.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

/// Bounded set of message fingerprints already relayed.
///
/// Oldest fingerprints are evicted first once `capacity` is reached.
/// All operations take one lock, so `check_and_record` is atomic with
/// respect to concurrent inbound handlers.
pub struct DedupCache {
    inner: Mutex<Entries>,
    capacity: usize,
}

#[derive(Default)]
struct Entries {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Check if a fingerprint has been recorded.
    pub fn seen(&self, fingerprint: &str) -> bool {
        self.inner.lock().seen.contains(fingerprint)
    }

    /// Record a fingerprint.
    pub fn record(&self, fingerprint: &str) {
        self.check_and_record(fingerprint);
    }

    /// Record a fingerprint, returning `true` if it was not already present.
    pub fn check_and_record(&self, fingerprint: &str) -> bool {
        let mut entries = self.inner.lock();
        if entries.seen.contains(fingerprint) {
            return false;
        }

        if entries.order.len() >= self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.seen.remove(&oldest);
            }
        }

        entries.seen.insert(fingerprint.to_string());
        entries.order.push_back(fingerprint.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every fingerprint.
    pub fn clear(&self) {
        let mut entries = self.inner.lock();
        entries.seen.clear();
        entries.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_and_seen() {
        let cache = DedupCache::new(10);
        assert!(!cache.seen("123"));
        cache.record("123");
        assert!(cache.seen("123"));
        assert!(!cache.check_and_record("123"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let cache = DedupCache::new(3);
        for fp in ["1", "2", "3", "4"] {
            cache.record(fp);
        }
        assert!(!cache.seen("1"));
        assert!(cache.seen("2"));
        assert!(cache.seen("4"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_concurrent_check_and_record_admits_once() {
        let cache = Arc::new(DedupCache::new(100));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.check_and_record("same"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|first| *first)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_clear() {
        let cache = DedupCache::new(3);
        cache.record("a");
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.seen("a"));
    }
}
