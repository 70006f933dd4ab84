//! A full node runtime on an ephemeral loopback port.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use node_runtime::{NodeConfig, NodeRuntime, SubsystemContainer};
use peer_transport::ports::outbound::PeerDirectory;
use shared_types::entities::{ip_to_u32, Peer};
use tokio::net::TcpListener;

pub struct TestNode {
    pub runtime: NodeRuntime,
    pub addr: SocketAddr,
}

impl TestNode {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut NodeConfig)) -> Self {
        let mut config = NodeConfig::default();
        config.transport.bind_host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.transport.peer_timeout_ms = 1000;
        configure(&mut config);

        let runtime = NodeRuntime::new(config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = runtime.start(listener).await.unwrap();
        Self { runtime, addr }
    }

    pub fn node(&self) -> Arc<SubsystemContainer> {
        self.runtime.container()
    }

    /// This node as a directory record on another node.
    pub fn as_peer(&self) -> Peer {
        Peer::new(loopback(), self.addr.port())
    }

    /// Make `other` known to this node.
    pub async fn know(&self, other: Peer) {
        self.node().directory.update(other).await.unwrap();
    }

    pub async fn stop(self) {
        self.runtime.shutdown().await;
    }
}

pub fn loopback() -> u32 {
    ip_to_u32(Ipv4Addr::LOCALHOST)
}

/// A loopback port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Poll `check` for up to two seconds.
pub async fn eventually<F, Fut>(check: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
