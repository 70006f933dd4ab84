//! # Shared Bus - Event Bus between Transport and Consensus
//!
//! The peer transport never calls the Consensus Engine directly. Received
//! blocks, votes and proposals are published here; locally produced blocks,
//! proposals, transactions and signatures arrive here for propagation.
//!
//! ## Choreography
//!
//! ```text
//! ┌──────────────┐   ReceiveBlock / ReceiveVotes    ┌──────────────┐
//! │              │   ReceivePropose / Message       │              │
//! │  Transport   │ ───────────────────────────────→ │  Consensus / │
//! │              │                                  │  Dapps       │
//! │              │ ←─────────────────────────────── │              │
//! └──────────────┘   NewBlock / NewPropose /        └──────────────┘
//!                    UnconfirmedTransaction /
//!                    SignatureCreated / Message
//! ```
//!
//! Delivery is fire-and-forget: publishers never observe what subscribers
//! do with an event.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, TransportEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
