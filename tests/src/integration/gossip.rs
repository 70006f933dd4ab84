//! # Gossip Between Nodes
//!
//! Locally produced objects reach a peer through the bus, the propagation
//! hooks, the reqwest exchange and the peer's gateway.
//!
//! ```text
//!   node A bus ──→ router ──→ hook ──→ POST /peer/... ──→ node B gateway ──→ B ledger
//! ```

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use peer_transport::ports::outbound::TransactionPool;
    use peer_transport::{PeerTransportApi, RequestOptions};
    use shared_bus::{EventPublisher, TransportEvent};
    use shared_types::entities::PeerFilter;
    use shared_types::ledger::{Block, BlockVotes, Transaction};

    use crate::integration::harness::{eventually, TestNode};

    fn transaction(id: &str) -> Transaction {
        let mut body = Map::new();
        body.insert("amount".into(), json!(100));
        Transaction {
            id: id.into(),
            signatures: vec![],
            body,
        }
    }

    fn block(height: u64) -> (Block, BlockVotes) {
        let id = format!("{}", 1000 + height);
        let block = serde_json::from_value(json!({
            "id": id,
            "height": height,
            "previousBlock": "999",
            "timestamp": 42,
        }))
        .unwrap();
        let votes = BlockVotes {
            height,
            id,
            signatures: vec![json!({"publicKey": "aa", "signature": "bb"})],
        };
        (block, votes)
    }

    #[tokio::test]
    async fn test_transaction_reaches_peer_pool() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        a.know(b.as_peer()).await;

        a.node()
            .ledger
            .receive_transactions(vec![transaction("5001")])
            .await
            .unwrap();

        let pool = b.node();
        assert!(
            eventually(|| {
                let pool = pool.clone();
                async move { pool.ledger.has_unconfirmed(&transaction("5001")).await }
            })
            .await
        );

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_new_block_applied_by_peer() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        a.know(b.as_peer()).await;

        let (block, votes) = block(1);
        a.node()
            .event_bus
            .publish(TransportEvent::NewBlock {
                block,
                votes,
                broadcast: true,
            })
            .await;

        let peer = b.node();
        assert!(
            eventually(|| {
                let peer = peer.clone();
                async move { peer.ledger.tip().is_some_and(|tip| tip.id == "1001") }
            })
            .await
        );

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_block_without_broadcast_stays_local() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        a.know(b.as_peer()).await;

        let (block, votes) = block(1);
        let used = a
            .node()
            .transport
            .on_new_block(block, votes, false)
            .await
            .unwrap();

        assert!(used.is_empty());
        assert!(b.node().ledger.tip().is_none());

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_request_any_reads_peer_height() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        a.know(b.as_peer()).await;

        let (block, _) = block(1);
        b.node().ledger.apply_block(block);

        let response = a
            .node()
            .transport
            .request_any(PeerFilter::default(), RequestOptions::get("/height"))
            .await
            .unwrap();

        assert_eq!(response.body["height"], 1);
        assert_eq!(response.peer.port, b.addr.port());

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_peer_list_served_over_http() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        let c = TestNode::start().await;
        b.know(c.as_peer()).await;

        let response = a
            .node()
            .transport
            .send(b.as_peer(), RequestOptions::get("/list"))
            .await
            .unwrap();

        let peers = response.body["peers"].as_array().unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0]["port"], c.addr.port());

        a.stop().await;
        b.stop().await;
        c.stop().await;
    }
}
