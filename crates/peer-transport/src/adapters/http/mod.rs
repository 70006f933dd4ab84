//! HTTP adapters: the axum peer gateway and the reqwest exchange.

pub mod exchange;
pub mod gateway;

pub use exchange::ReqwestExchange;
pub use gateway::{router, serve, AppState, BODY_LIMIT_BYTES};
