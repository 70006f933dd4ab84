//! # Peer Reputation Policy
//!
//! Maps what was observed about a peer to the registry action the Peer
//! Directory must take. Pure: applying the action is the service's job.
//!
//! | Observation                          | Action         |
//! |--------------------------------------|----------------|
//! | outbound timeout / refused           | remove         |
//! | outbound other error or non-200      | ban 600s       |
//! | same, caller passed `not_ban`        | none           |
//! | inbound malformed payload            | ban 3600s      |

use super::config::{HARD_BAN_SECS, SOFT_BAN_SECS};
use super::errors::ExchangeError;

/// Something a peer did that may affect its standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Outbound request could not reach the peer at all.
    Unreachable,
    /// Outbound request reached the peer but failed or returned non-200.
    Misbehaved,
    /// Peer sent a block, votes or transaction that failed normalization.
    MalformedPayload,
}

impl Observation {
    /// Classify a failed outbound exchange.
    pub fn from_exchange(error: &ExchangeError) -> Self {
        if error.is_unreachable() {
            Self::Unreachable
        } else {
            Self::Misbehaved
        }
    }
}

/// Registry action the Peer Directory is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationAction {
    /// Drop the peer from the registry.
    Remove,
    /// Mark the peer banned for `secs` seconds.
    Ban { secs: u64 },
    /// Leave the peer untouched.
    Keep,
}

/// Decide the registry action for an observation.
///
/// `exempt` is the caller's `not_ban` opt-out; it only suppresses the soft
/// ban and never prevents the removal of an unreachable peer.
pub fn decide(observation: Observation, exempt: bool) -> ReputationAction {
    match observation {
        Observation::Unreachable => ReputationAction::Remove,
        Observation::Misbehaved if exempt => ReputationAction::Keep,
        Observation::Misbehaved => ReputationAction::Ban {
            secs: SOFT_BAN_SECS,
        },
        Observation::MalformedPayload => ReputationAction::Ban {
            secs: HARD_BAN_SECS,
        },
    }
}
