//! Cross-crate flows. Every test starts real nodes on `127.0.0.1:0`.

#[cfg(test)]
mod harness;

mod dapps;
mod gossip;
mod reputation;
