//! # Reputation Over Real Failures
//!
//! Connection refusals remove a peer, bad answers soft-ban it, and a
//! malformed payload gets the sender banned by the receiving node.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use peer_transport::{PeerTransportApi, RequestOptions, TransportError};
    use shared_types::entities::{Peer, PeerFilter, PeerState};

    use crate::integration::harness::{closed_port, eventually, loopback, TestNode};

    #[tokio::test]
    async fn test_unreachable_peer_removed_after_broadcast() {
        let a = TestNode::start().await;
        let dead = closed_port().await;
        a.know(Peer::new(loopback(), dead)).await;

        let used = a
            .node()
            .transport
            .broadcast(PeerFilter::default(), RequestOptions::get("/height"))
            .await
            .unwrap();

        assert_eq!(used.len(), 1);
        let node = a.node();
        assert!(
            eventually(|| {
                let node = node.clone();
                async move { node.directory.get(loopback(), dead).is_none() }
            })
            .await
        );

        a.stop().await;
    }

    #[tokio::test]
    async fn test_wrong_network_peer_soft_banned() {
        let a = TestNode::start().await;
        let other = TestNode::start_with(|config| config.transport.magic = "othernet".into()).await;
        a.know(other.as_peer()).await;

        let result = a
            .node()
            .transport
            .send(other.as_peer(), RequestOptions::get("/height"))
            .await;

        assert!(matches!(
            result,
            Err(TransportError::BadStatus { status: 500, .. })
        ));
        let record = a.node().directory.get(loopback(), other.addr.port()).unwrap();
        assert_eq!(record.state, PeerState::Banned);

        let used = a
            .node()
            .transport
            .broadcast(PeerFilter::default(), RequestOptions::get("/height"))
            .await
            .unwrap();
        assert!(used.is_empty());

        a.stop().await;
        other.stop().await;
    }

    #[tokio::test]
    async fn test_exempt_request_keeps_peer_active() {
        let a = TestNode::start().await;
        let other = TestNode::start_with(|config| config.transport.magic = "othernet".into()).await;
        a.know(other.as_peer()).await;

        let result = a
            .node()
            .transport
            .send(other.as_peer(), RequestOptions::get("/height").without_ban())
            .await;

        assert!(result.is_err());
        let record = a.node().directory.get(loopback(), other.addr.port()).unwrap();
        assert_eq!(record.state, PeerState::Active);

        a.stop().await;
        other.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_transaction_bans_sender() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        b.know(a.as_peer()).await;

        let response = a
            .node()
            .transport
            .send(
                b.as_peer(),
                RequestOptions::post("/transactions", json!({"transaction": "%%not-base64%%"})),
            )
            .await
            .unwrap();

        assert_eq!(response.body["success"], false);
        let record = b.node().directory.get(loopback(), a.addr.port()).unwrap();
        assert_eq!(record.state, PeerState::Banned);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_not_ready_node_rejects_peers() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        b.node().transport.cleanup();

        let result = a
            .node()
            .transport
            .send(b.as_peer(), RequestOptions::get("/height").without_ban())
            .await;

        assert!(matches!(
            result,
            Err(TransportError::BadStatus { status: 500, .. })
        ));

        a.stop().await;
        b.stop().await;
    }
}
