//! # Domain Layer for the Peer Transport
//!
//! Pure decision logic with no I/O. The service layer feeds observations
//! in and carries the resulting actions out to the collaborators.
//!
//! ## Contents
//!
//! - **config**: `TransportConfig`, ban durations, header bounds
//! - **reputation**: outbound/inbound observation → registry action
//! - **fingerprint**: dapp message fingerprints
//! - **dedup**: bounded `DedupCache` of relayed fingerprints
//! - **headers**: protocol header validation for requests and responses
//! - **payload**: tagged wire payloads and shape contracts
//! - **request**: the outbound request envelope
//! - **errors**: error taxonomy and gateway rejections

mod config;
mod dedup;
mod errors;
mod fingerprint;
mod headers;
mod payload;
mod reputation;
mod request;

pub use config::*;
pub use dedup::*;
pub use errors::*;
pub use fingerprint::{fingerprint, matches as fingerprint_matches};
pub use headers::*;
pub use payload::*;
pub use reputation::*;
pub use request::*;
