//! # Dapp Registry
//!
//! Installed dapps keyed by id. Each dapp keeps an inbox of relayed message
//! bodies and a table of request routes keyed by `(method, path)`.

use async_trait::async_trait;
use parking_lot::RwLock;
use peer_transport::domain::DispatchError;
use peer_transport::ports::outbound::AppDispatcher;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Handler serving one dapp route. Receives the request query.
pub type RouteHandler = Arc<dyn Fn(Value) -> Result<Value, DispatchError> + Send + Sync>;

#[derive(Default)]
struct Dapp {
    inbox: Vec<Value>,
    routes: HashMap<(String, String), RouteHandler>,
}

/// `AppDispatcher` over dapps installed in this process.
#[derive(Default)]
pub struct DappRegistry {
    dapps: RwLock<HashMap<String, Dapp>>,
}

impl DappRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a dapp with no routes. Reinstalling keeps the existing state.
    pub fn install(&self, dappid: impl Into<String>) {
        self.dapps.write().entry(dappid.into()).or_default();
    }

    /// Register `handler` for `method path` on an installed dapp.
    pub fn route<F>(
        &self,
        dappid: &str,
        method: &str,
        path: &str,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Value) -> Result<Value, DispatchError> + Send + Sync + 'static,
    {
        let mut dapps = self.dapps.write();
        let dapp = dapps.get_mut(dappid).ok_or_else(|| not_found(dappid))?;
        dapp.routes.insert(
            (method.to_ascii_lowercase(), path.to_string()),
            Arc::new(handler),
        );
        Ok(())
    }

    /// Message bodies delivered to `dappid`, oldest first.
    pub fn inbox(&self, dappid: &str) -> Vec<Value> {
        self.dapps
            .read()
            .get(dappid)
            .map(|dapp| dapp.inbox.clone())
            .unwrap_or_default()
    }
}

fn not_found(dappid: &str) -> DispatchError {
    DispatchError(format!("Dapp not found: {}", dappid))
}

#[async_trait]
impl AppDispatcher for DappRegistry {
    async fn deliver_message(&self, dappid: &str, body: Value) -> Result<Value, DispatchError> {
        let mut dapps = self.dapps.write();
        let dapp = dapps.get_mut(dappid).ok_or_else(|| not_found(dappid))?;
        dapp.inbox.push(body);
        debug!(dappid, queued = dapp.inbox.len(), "Dapp message delivered");
        Ok(json!({}))
    }

    async fn deliver_request(
        &self,
        dappid: &str,
        method: &str,
        path: &str,
        query: Value,
    ) -> Result<Value, DispatchError> {
        let handler = {
            let dapps = self.dapps.read();
            let dapp = dapps.get(dappid).ok_or_else(|| not_found(dappid))?;
            dapp.routes
                .get(&(method.to_ascii_lowercase(), path.to_string()))
                .cloned()
                .ok_or_else(|| {
                    DispatchError(format!("Route not found: {} {}", method, path))
                })?
        };
        handler(query)
    }
}
