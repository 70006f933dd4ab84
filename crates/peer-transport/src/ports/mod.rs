//! Ports of the peer transport.
//!
//! - **inbound**: the API the rest of the node drives the transport with
//! - **outbound**: the collaborators the transport requires

pub mod inbound;
pub mod outbound;
