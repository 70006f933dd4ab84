//! Inbound ports (API) for the peer transport.

use async_trait::async_trait;
use shared_types::entities::{Peer, PeerFilter, ProtocolHeaders};
use shared_types::ledger::{Block, BlockVotes, DappMessage, Propose, SignatureShare, Transaction};

use crate::domain::{PeerResponse, RequestOptions, TransportError};

/// Operations the rest of the node drives the transport with.
#[async_trait]
pub trait PeerTransportApi: Send + Sync {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Install the protocol headers advertised on every exchange.
    fn on_bind(&self, headers: ProtocolHeaders);

    /// Start serving peers.
    fn on_blockchain_ready(&self);

    /// Stop serving peers.
    fn cleanup(&self);

    // =========================================================================
    // OUTBOUND PRIMITIVES
    // =========================================================================

    /// Fan a request out to a bounded set of peers; returns the peers used.
    async fn broadcast(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<Vec<Peer>, TransportError>;

    /// Send a request to whichever live peer answers first.
    async fn request_any(
        &self,
        filter: PeerFilter,
        options: RequestOptions,
    ) -> Result<PeerResponse, TransportError>;

    /// Send one request to one peer.
    async fn send(&self, peer: Peer, options: RequestOptions)
        -> Result<PeerResponse, TransportError>;

    // =========================================================================
    // PROPAGATION HOOKS
    // =========================================================================

    async fn on_new_block(
        &self,
        block: Block,
        votes: BlockVotes,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError>;

    async fn on_new_propose(
        &self,
        propose: Propose,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError>;

    async fn on_unconfirmed_transaction(
        &self,
        transaction: Transaction,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError>;

    async fn on_signature(
        &self,
        signature: SignatureShare,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError>;

    async fn on_message(
        &self,
        message: DappMessage,
        broadcast: bool,
    ) -> Result<Vec<Peer>, TransportError>;

    /// Deliver votes straight to the peer at `address` (`host:port`).
    async fn send_votes(
        &self,
        votes: BlockVotes,
        address: String,
    ) -> Result<PeerResponse, TransportError>;

    // =========================================================================
    // APPLICATION RELAY
    // =========================================================================

    /// Stamp and gossip a dapp message; returns the stamped message.
    async fn publish_message(&self, message: DappMessage) -> Result<DappMessage, TransportError>;

    /// Stamp and send a dapp request, to `body.peer` when given.
    async fn request_dapp(&self, message: DappMessage) -> Result<PeerResponse, TransportError>;
}
