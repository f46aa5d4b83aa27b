//! Network infrastructure for the server.
//!
//! # Sub-modules
//!
//! - **`broadcast_server`** – Accepts TCP clients and pushes every monitor
//!   switch to all of them, resynchronising late joiners with the current
//!   index.

use std::net::SocketAddr;

use thiserror::Error;

pub mod broadcast_server;

pub use broadcast_server::{
    BroadcastConfig, BroadcastReport, BroadcastServer, BroadcastSwitchAction,
};

/// Errors raised by the network layer.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server is not running")]
    NotRunning,
}
