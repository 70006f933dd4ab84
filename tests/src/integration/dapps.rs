//! # Dapp Relay
//!
//! Stamped messages travel to the peers serving the same dapp and are
//! delivered once; requests are answered by the remote dapp's routes.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use peer_transport::PeerTransportApi;
    use shared_types::entities::Peer;
    use shared_types::ledger::DappMessage;

    use crate::integration::harness::{eventually, TestNode};

    const DAPP: &str = "7821";

    async fn dapp_pair() -> (TestNode, TestNode) {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        b.node().dapps.install(DAPP);
        a.know(Peer {
            dappid: Some(DAPP.into()),
            ..b.as_peer()
        })
        .await;
        (a, b)
    }

    #[tokio::test]
    async fn test_published_message_delivered_once() {
        let (a, b) = dapp_pair().await;
        let body = json!({"chat": "hello"});

        let stamped = a
            .node()
            .transport
            .publish_message(DappMessage::new(DAPP, body.clone()))
            .await
            .unwrap();

        let node = b.node();
        assert!(
            eventually(|| {
                let node = node.clone();
                async move { node.dapps.inbox(DAPP).len() == 1 }
            })
            .await
        );

        // Relaying the same stamp again is acknowledged without redelivery.
        let used = a.node().transport.on_message(stamped, true).await.unwrap();
        assert_eq!(used.len(), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(b.node().dapps.inbox(DAPP), vec![body]);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_message_skips_peers_of_other_dapps() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        b.node().dapps.install(DAPP);
        a.know(b.as_peer()).await;

        let used = a
            .node()
            .transport
            .on_message(DappMessage::new(DAPP, json!({})), true)
            .await
            .unwrap();

        assert!(used.is_empty());
        assert!(b.node().dapps.inbox(DAPP).is_empty());

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_dapp_request_answered_by_route() {
        let (a, b) = dapp_pair().await;
        b.node()
            .dapps
            .route(DAPP, "get", "/status", |query| {
                Ok(json!({"status": "ok", "echo": query}))
            })
            .unwrap();

        let response = a
            .node()
            .transport
            .request_dapp(DappMessage::new(
                DAPP,
                json!({"method": "get", "path": "/status", "query": {"n": 1}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.body["success"], true);
        assert_eq!(response.body["status"], "ok");
        assert_eq!(response.body["echo"], json!({"n": 1}));

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_dapp_request_to_explicit_peer() {
        let a = TestNode::start().await;
        let b = TestNode::start().await;
        b.node().dapps.install(DAPP);

        let response = a
            .node()
            .transport
            .request_dapp(DappMessage::new(
                DAPP,
                json!({
                    "method": "get",
                    "path": "/missing",
                    "peer": {"ip": "127.0.0.1", "port": b.addr.port()},
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.body["success"], false);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("Route not found"));

        a.stop().await;
        b.stop().await;
    }
}
