//! Producer connection lifecycle
//!
//! One [`ProducerSession`] per upload request. It owns the connection's
//! decoder and stream lease, and moves through
//! `Idle → Registered → Streaming → Terminated`.

pub mod context;
pub mod producer;
pub mod state;

pub use context::ProducerContext;
pub use producer::ProducerSession;
pub use state::{ConnectionPhase, ConnectionState, TerminationReason};
