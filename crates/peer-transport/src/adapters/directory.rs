//! In-memory Peer Directory.
//!
//! Peers are keyed by `(ip, port)`. A ban stores its expiry next to the
//! record; expired bans are lifted lazily the next time the table is read.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use shared_types::entities::{Peer, PeerFilter, PeerKey, PeerState};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::DirectoryError;
use crate::ports::outbound::PeerDirectory;

#[derive(Debug, Clone)]
struct Entry {
    peer: Peer,
    banned_until: Option<Instant>,
}

/// Peer table held in process memory.
#[derive(Default)]
pub struct InMemoryPeerDirectory {
    entries: RwLock<HashMap<PeerKey, Entry>>,
}

impl InMemoryPeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table, e.g. from configured bootstrap peers.
    pub fn with_peers(peers: impl IntoIterator<Item = Peer>) -> Self {
        let entries = peers
            .into_iter()
            .map(|peer| {
                (
                    peer.key(),
                    Entry {
                        peer,
                        banned_until: None,
                    },
                )
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Number of records, banned ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Current record for `(ip, port)`.
    pub fn get(&self, ip: u32, port: u16) -> Option<Peer> {
        self.lift_expired_bans();
        self.entries
            .read()
            .get(&PeerKey::new(ip, port))
            .map(|entry| entry.peer.clone())
    }

    fn lift_expired_bans(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        for entry in entries.values_mut() {
            if entry.banned_until.is_some_and(|until| until <= now) {
                entry.banned_until = None;
                entry.peer.state = PeerState::Active;
                debug!(peer = %entry.peer.describe(), "Ban expired");
            }
        }
    }
}

#[async_trait]
impl PeerDirectory for InMemoryPeerDirectory {
    async fn list(&self, filter: &PeerFilter) -> Result<Vec<Peer>, DirectoryError> {
        self.lift_expired_bans();

        let mut peers: Vec<Peer> = self
            .entries
            .read()
            .values()
            .filter(|entry| entry.peer.state == PeerState::Active)
            .filter(|entry| match filter.dappid.as_deref() {
                Some(dappid) => entry.peer.dappid.as_deref() == Some(dappid),
                None => true,
            })
            .map(|entry| entry.peer.clone())
            .collect();

        peers.shuffle(&mut rand::thread_rng());
        if let Some(limit) = filter.limit {
            peers.truncate(limit);
        }
        Ok(peers)
    }

    async fn update(&self, peer: Peer) -> Result<(), DirectoryError> {
        let mut entries = self.entries.write();
        match entries.get_mut(&peer.key()) {
            Some(entry) => {
                let previous = entry.peer.clone();
                entry.peer = Peer {
                    os: peer.os.or(previous.os),
                    version: peer.version.or(previous.version),
                    dappid: peer.dappid.or(previous.dappid),
                    // an update never lifts a ban early
                    state: previous.state,
                    ..peer
                };
            }
            None => {
                debug!(peer = %peer.describe(), "Peer added");
                entries.insert(
                    peer.key(),
                    Entry {
                        peer,
                        banned_until: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn remove(&self, ip: u32, port: u16) -> Result<(), DirectoryError> {
        self.entries.write().remove(&PeerKey::new(ip, port));
        Ok(())
    }

    async fn set_state(
        &self,
        ip: u32,
        port: u16,
        state: PeerState,
        expiry_secs: u64,
    ) -> Result<(), DirectoryError> {
        let key = PeerKey::new(ip, port);
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))?;

        entry.peer.state = state;
        entry.banned_until = match state {
            PeerState::Banned => Some(Instant::now() + Duration::from_secs(expiry_secs)),
            PeerState::Active => None,
        };
        Ok(())
    }
}
