//! # Error Types
//!
//! Defines error types shared across crates.

use std::net::IpAddr;
use thiserror::Error;

/// Errors converting a socket address into a directory key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address has no IPv4 form and cannot be integer-encoded.
    #[error("Address {0} is not IPv4")]
    NotIpv4(IpAddr),
}
