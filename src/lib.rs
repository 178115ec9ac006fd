//! Live frame relay
//!
//! Producers (screen and webcam capture agents) upload JPEG frames over a
//! long-lived HTTP POST whose body is a sequence of length-prefixed frames.
//! Viewers connect over a WebSocket and receive every frame plus presence
//! updates describing which producers are currently streaming.
//!
//! # Architecture
//!
//! ```text
//!   POST /stream/{kind}?clientId=..            GET /view (WebSocket)
//!            │                                        ▲
//!            ▼                                        │
//!   ProducerSession ──► FrameDecoder                  │
//!            │                                        │
//!            ▼                                        │
//!        Arc<Relay> ─┬─► StreamRegistry (presence)    │
//!                    └─► Broadcaster ─► ViewerHandle ─┘
//! ```
//!
//! The registry and the viewer set are only reachable through [`Relay`], so
//! connection handlers never touch the shared maps directly.

pub mod broadcast;
pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use relay::Relay;
pub use server::{RelayServer, ServerConfig};
