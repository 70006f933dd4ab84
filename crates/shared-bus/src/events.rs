//! # Transport Events
//!
//! Every event that crosses the boundary between the peer transport and
//! the rest of the node.

use serde::{Deserialize, Serialize};
use shared_types::ledger::{Block, BlockVotes, DappMessage, Propose, SignatureShare, Transaction};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransportEvent {
    // =========================================================================
    // INBOUND: received from peers, consumed by consensus
    // =========================================================================
    /// A peer pushed a normalized block together with its votes.
    ReceiveBlock { block: Block, votes: BlockVotes },

    /// A peer pushed a batch of block votes.
    ReceiveVotes(BlockVotes),

    /// A peer pushed a block proposal.
    ReceivePropose(Propose),

    /// A dapp message.
    ///
    /// With `broadcast = true` the transport relays it to the peers serving
    /// the same dapp; the inbound handler emits it this way once the local
    /// dapp accepted it. With `broadcast = false` it stays local.
    Message { message: DappMessage, broadcast: bool },

    // =========================================================================
    // OUTBOUND: produced locally, relayed to peers by the transport
    // =========================================================================
    /// Consensus applied a new block.
    NewBlock {
        block: Block,
        votes: BlockVotes,
        broadcast: bool,
    },

    /// Consensus produced a new proposal.
    NewPropose { propose: Propose, broadcast: bool },

    /// A transaction entered the unconfirmed pool.
    UnconfirmedTransaction {
        transaction: Transaction,
        broadcast: bool,
    },

    /// A local multisignature share was created.
    SignatureCreated {
        signature: SignatureShare,
        broadcast: bool,
    },
}

impl TransportEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ReceiveBlock { .. } | Self::ReceiveVotes(_) | Self::ReceivePropose(_) => {
                EventTopic::Consensus
            }
            Self::Message {
                broadcast: false, ..
            } => EventTopic::Application,
            Self::Message {
                broadcast: true, ..
            }
            | Self::NewBlock { .. }
            | Self::NewPropose { .. }
            | Self::UnconfirmedTransaction { .. }
            | Self::SignatureCreated { .. } => EventTopic::Propagation,
        }
    }

    /// Short event name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveBlock { .. } => "receive_block",
            Self::ReceiveVotes(_) => "receive_votes",
            Self::ReceivePropose(_) => "receive_propose",
            Self::Message { .. } => "message",
            Self::NewBlock { .. } => "new_block",
            Self::NewPropose { .. } => "new_propose",
            Self::UnconfirmedTransaction { .. } => "unconfirmed_transaction",
            Self::SignatureCreated { .. } => "signature_created",
        }
    }
}

/// Topics for event filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Blocks, votes and proposals received from peers.
    Consensus,
    /// Dapp messages received from peers.
    Application,
    /// Locally produced objects waiting to be relayed.
    Propagation,
    /// All events (wildcard).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Topics to include (empty = all topics).
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: vec![] }
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &TransportEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
