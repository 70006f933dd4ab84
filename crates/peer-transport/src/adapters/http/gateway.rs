//! # Peer Gateway (axum)
//!
//! Serves the `/peer` endpoints. Every request passes the admission
//! middleware first; every response carries this node's protocol headers.
//!
//! ```text
//! TraceLayer ──→ RequestBodyLimit ──→ admission ──→ route handler ──→ service
//!                                        │
//!                                        └──→ 500 {success: false, error}
//! ```

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;
use shared_types::entities::{ProtocolHeaders, HEADER_FORWARDED_FOR};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::domain::{failure, GatewayRejection, RawHeaders, PEER_API_PREFIX};
use crate::service::{Caller, InboundMeta, PeerTransportService};

/// Largest request body accepted from a peer.
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PeerTransportService>,
}

/// Build the gateway router.
pub fn router(service: Arc<PeerTransportService>) -> Router {
    let state = AppState { service };

    let peer = Router::new()
        .route("/list", get(list_peers).fallback(not_found))
        .route("/blocks/common", get(common_block).fallback(not_found))
        .route("/blocks", get(blocks).post(receive_block).fallback(not_found))
        .route("/votes", post(receive_votes).fallback(not_found))
        .route("/propose", post(receive_propose).fallback(not_found))
        .route("/signatures", get(signatures).post(receive_signature).fallback(not_found))
        .route("/transactions", get(transactions).post(receive_transaction).fallback(not_found))
        .route("/height", get(height).fallback(not_found))
        .route("/dapp/message", post(dapp_message).fallback(not_found))
        .route("/dapp/request", post(dapp_request).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), admission))
        .with_state(state.clone());

    Router::new()
        .nest(PEER_API_PREFIX, peer)
        .fallback(outside_peer_api)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
}

/// Serve the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    service: Arc<PeerTransportService>,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Peer gateway listening");
    axum::serve(
        listener,
        router(service).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

// =============================================================================
// ADMISSION
// =============================================================================

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn attach_headers(response: &mut Response, local: &ProtocolHeaders) {
    for (name, value) in local.pairs() {
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(name, value);
        }
    }
}

async fn admission(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let local = state.service.local_headers();
    let (mut parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, BODY_LIMIT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Unreadable request body");
            let mut response = (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(failure("Request body too large")),
            )
                .into_response();
            attach_headers(&mut response, &local);
            return response;
        }
    };

    let meta = InboundMeta {
        forwarded_for: header(&parts.headers, HEADER_FORWARDED_FOR),
        remote: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip()),
        headers: RawHeaders::from_lookup(|name| header(&parts.headers, name)),
        dappid: lenient_json(&bytes)
            .get("dappid")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let mut response = match state.service.admit(&meta).await {
        Ok(caller) => {
            parts.extensions.insert(caller);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(rejection) => {
            let address = meta
                .forwarded_for
                .clone()
                .or_else(|| meta.remote.map(|ip| ip.to_string()))
                .unwrap_or_default();
            error!(uri = %parts.uri, address = %address, reason = %rejection, "Peer request rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(rejection.body())).into_response()
        }
    };
    attach_headers(&mut response, &local);
    response
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Malformed bodies are handed on as `null` and fail the handler's checks.
fn lenient_json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

async fn list_peers(State(state): State<AppState>) -> Json<Value> {
    Json(state.service.list_peers().await)
}

async fn common_block(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(state.service.common_block(&caller, &query).await)
}

async fn blocks(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let last_block_id = query.get("lastBlockId").map(String::as_str);
    Json(state.service.blocks(last_block_id).await)
}

async fn receive_block(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Json<Value> {
    Json(state.service.receive_block(&caller, &lenient_json(&body)).await)
}

async fn receive_votes(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.service.receive_votes(&lenient_json(&body)).await)
}

async fn receive_propose(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.service.receive_propose(&lenient_json(&body)).await)
}

async fn signatures(State(state): State<AppState>) -> Json<Value> {
    Json(state.service.signatures().await)
}

async fn receive_signature(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.service.receive_signature(&lenient_json(&body)).await)
}

async fn transactions(State(state): State<AppState>) -> Json<Value> {
    Json(state.service.transactions().await)
}

async fn receive_transaction(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Json<Value> {
    Json(
        state
            .service
            .receive_transaction(&caller, &lenient_json(&body))
            .await,
    )
}

async fn height(State(state): State<AppState>) -> Json<Value> {
    Json(state.service.height().await)
}

async fn dapp_message(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.service.dapp_message(&lenient_json(&body)).await)
}

async fn dapp_request(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.service.dapp_request(&lenient_json(&body)).await)
}

async fn not_found() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(GatewayRejection::NotFound.body()),
    )
        .into_response()
}

/// Paths outside `/peer` skip admission but still carry local headers.
async fn outside_peer_api(State(state): State<AppState>) -> Response {
    let mut response = not_found().await;
    attach_headers(&mut response, &state.service.local_headers());
    response
}
