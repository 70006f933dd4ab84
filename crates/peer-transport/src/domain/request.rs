//! Outbound request envelope.

use serde_json::Value;
use shared_types::entities::Peer;
use std::fmt;

use super::config::PEER_API_PREFIX;

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Where on the peer a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Endpoint name under the peer namespace, e.g. `/blocks`.
    Api(String),
    /// Literal path.
    Url(String),
}

/// Caller-side description of one outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub target: Target,
    pub method: Method,
    /// Header overrides merged over the local protocol headers.
    pub headers: Vec<(String, String)>,
    pub data: Value,
    /// Suppress the soft ban on failure.
    pub not_ban: bool,
}

impl RequestOptions {
    pub fn get(api: impl Into<String>) -> Self {
        Self {
            target: Target::Api(api.into()),
            method: Method::Get,
            headers: Vec::new(),
            data: Value::Null,
            not_ban: false,
        }
    }

    pub fn post(api: impl Into<String>, data: Value) -> Self {
        Self {
            method: Method::Post,
            data,
            ..Self::get(api)
        }
    }

    /// Request against a literal path instead of a peer endpoint.
    pub fn url(method: Method, url: impl Into<String>) -> Self {
        Self {
            target: Target::Url(url.into()),
            method,
            ..Self::get(String::new())
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn without_ban(mut self) -> Self {
        self.not_ban = true;
        self
    }

    /// Path part of the request URL.
    pub fn path(&self) -> String {
        match &self.target {
            Target::Api(api) => format!("{}{}", PEER_API_PREFIX, api),
            Target::Url(url) => url.clone(),
        }
    }

    /// Full URL of the request against `peer`.
    pub fn url_for(&self, peer: &Peer) -> String {
        format!("{}{}", peer.base_url(), self.path())
    }
}

/// Successful response from a peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerResponse {
    pub body: Value,
    pub peer: Peer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::entities::ip_to_u32;
    use std::net::Ipv4Addr;

    #[test]
    fn test_api_paths_are_namespaced() {
        let options = RequestOptions::post("/blocks", json!({}));
        assert_eq!(options.path(), "/peer/blocks");
        assert_eq!(options.method, Method::Post);

        let raw = RequestOptions::url(Method::Get, "/api/status");
        assert_eq!(raw.path(), "/api/status");
    }

    #[test]
    fn test_url_for_peer() {
        let peer = Peer::new(ip_to_u32(Ipv4Addr::new(10, 0, 0, 3)), 7040);
        let options = RequestOptions::get("/height");
        assert_eq!(options.url_for(&peer), "http://10.0.0.3:7040/peer/height");

        let addressed = Peer::from_address("127.0.0.1:9000");
        assert_eq!(
            options.url_for(&addressed),
            "http://127.0.0.1:9000/peer/height"
        );
    }

    #[test]
    fn test_builder_flags() {
        let options = RequestOptions::get("/list")
            .with_header("port", "1")
            .without_ban();
        assert!(options.not_ban);
        assert_eq!(options.headers, vec![("port".to_string(), "1".to_string())]);
    }
}
