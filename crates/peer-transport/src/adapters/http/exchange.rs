//! HTTP exchange over reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::error::Error as _;
use std::io;

use crate::domain::{ExchangeError, Method, RequestBody};
use crate::ports::outbound::{HttpExchange, OutboundRequest, RawResponse};

/// `HttpExchange` backed by a pooled reqwest client.
#[derive(Clone)]
pub struct ReqwestExchange {
    client: Client,
}

impl ReqwestExchange {
    pub fn new() -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExchangeError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Map a transport failure onto the reputation-relevant kinds.
fn classify(error: reqwest::Error) -> ExchangeError {
    let message = error.to_string();
    if error.is_timeout() && error.is_connect() {
        return ExchangeError::Timeout(message);
    }
    if error.is_timeout() {
        return ExchangeError::SocketTimeout(message);
    }

    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            match io_error.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return ExchangeError::ConnectionRefused(message)
                }
                io::ErrorKind::TimedOut => return ExchangeError::Timeout(message),
                _ => {}
            }
        }
        source = cause.source();
    }
    ExchangeError::Other(message)
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, ExchangeError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(data)) => builder.json(&data),
            Some(RequestBody::Raw(text)) => builder.body(text),
            None => builder,
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(classify)?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| Value::String(text));

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
