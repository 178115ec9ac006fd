//! Fan-out to viewers
//!
//! Every viewer owns a bounded queue. Publishing serializes a message once,
//! then offers the shared text to each queue without waiting:
//!
//! ```text
//!   publish_frame() ──► encode once ──► Arc<str>
//!                                         │ try_send (never blocks)
//!                   ┌─────────────────────┼─────────────────────┐
//!                   ▼                     ▼                     ▼
//!              [queue: v1]           [queue: v2]           [queue: v3]
//!                   │                     │                  full/closed
//!                   ▼                     ▼                     ▼
//!               WebSocket             WebSocket          viewer dropped
//! ```
//!
//! A full queue means the viewer is not keeping up; it is removed instead of
//! slowing the producer down. A closed queue means the viewer went away.

pub mod hub;
pub mod message;
pub mod viewer;

pub use hub::{BroadcastStats, Broadcaster, DEFAULT_VIEWER_QUEUE_CAPACITY};
pub use message::{EncodedMessage, ViewerMessage, ViewerRequest};
pub use viewer::{ViewerHandle, ViewerId};
