//! Producer client
//!
//! What a capture agent uses to push frames into a relay:
//! - One [`FramePublisher`] per stream kind, sharing a client id
//! - Frames are length-prefixed and streamed over a single POST body

pub mod config;
pub mod publisher;

pub use config::ClientConfig;
pub use publisher::{FramePublisher, PLACEHOLDER_JPEG};
