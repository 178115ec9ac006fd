//! HTTP/WebSocket surface of the relay
//!
//! Producers upload over `POST /stream/{kind}`, viewers attach to `GET /view`.
//! Everything here is a thin adapter onto [`Relay`](crate::relay::Relay).

pub mod config;
pub mod handlers;
pub mod listener;
pub mod reject;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use listener::RelayServer;
pub use reject::RejectReason;
pub use routes::{build_router, AppState};
