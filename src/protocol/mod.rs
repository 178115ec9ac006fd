//! Producer upload wire format
//!
//! A producer upload body is a plain concatenation of frames:
//!
//! ```text
//! +----------------------+-----------------+----------------------+-----
//! | Length L (u32, BE)   | Payload (L)     | Length (u32, BE)     | ...
//! +----------------------+-----------------+----------------------+-----
//! ```
//!
//! There is no delimiter or header beyond the length prefix, and the transport
//! may split the byte sequence at arbitrary points.

pub mod constants;
pub mod decoder;
pub mod encoder;

pub use constants::{DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
pub use decoder::{DecodeState, FrameDecoder};
pub use encoder::{encode_frame, encode_frame_into};
