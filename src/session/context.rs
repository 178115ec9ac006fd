//! Producer connection context
//!
//! Identity of one upload, attached to log lines and passed around instead
//! of the individual fields.

use std::net::SocketAddr;

use crate::registry::{ClientId, StreamKind};

/// Identity of one producer connection
#[derive(Debug, Clone)]
pub struct ProducerContext {
    /// Relay-assigned connection id
    pub session_id: u64,

    /// Producer-supplied client id
    pub client_id: ClientId,

    /// Stream kind from the request path
    pub kind: StreamKind,

    /// Remote peer address, when the transport provides it
    pub peer_addr: Option<SocketAddr>,
}

impl ProducerContext {
    /// Create a new context
    pub fn new(session_id: u64, client_id: ClientId, kind: StreamKind) -> Self {
        Self {
            session_id,
            client_id,
            kind,
            peer_addr: None,
        }
    }

    /// Attach the remote peer address
    pub fn with_peer(mut self, peer_addr: Option<SocketAddr>) -> Self {
        self.peer_addr = peer_addr;
        self
    }
}
