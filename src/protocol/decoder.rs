//! Length-prefixed frame decoder
//!
//! Each producer connection owns one [`FrameDecoder`]. Chunks are fed in as
//! they arrive from the transport and complete payloads come out, regardless
//! of where the transport happened to split the byte stream.
//!
//! ```text
//!          ≥4 bytes buffered: read L
//!   ┌────────────────┐ ───────────────────► ┌─────────────────────────┐
//!   │ AwaitingLength │                      │ AwaitingPayload { L }   │
//!   └────────────────┘ ◄─────────────────── └─────────────────────────┘
//!      ▲        │       ≥L bytes buffered: emit payload
//!      └────────┘
//!     L > max frame size: drop L, read the next 4 bytes as a new prefix
//! ```
//!
//! An oversized length is not an error. The declared frame is abandoned and
//! decoding resumes at the byte right after the offending prefix. If that
//! length was garbage rather than a real prefix, the stream stays
//! desynchronized until the producer reconnects.

use bytes::{Buf, Bytes, BytesMut};

use super::constants::{DECODER_INITIAL_CAPACITY, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};

/// Decoder sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for a 4-byte big-endian length prefix
    AwaitingLength,
    /// Length prefix consumed, waiting for `remaining` payload bytes
    AwaitingPayload { remaining: usize },
}

/// Per-connection frame decoder
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes received but not yet consumed
    buffer: BytesMut,
    /// Current sub-state
    state: DecodeState,
    /// Largest payload length accepted
    max_frame_size: usize,
    /// Number of length prefixes discarded for exceeding `max_frame_size`
    oversized_frames: u64,
}

impl FrameDecoder {
    /// Create a decoder with the default 10 MiB frame limit
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a decoder with a custom frame limit
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DECODER_INITIAL_CAPACITY),
            state: DecodeState::AwaitingLength,
            max_frame_size,
            oversized_frames: 0,
        }
    }

    /// Current sub-state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Number of buffered, not yet consumed bytes
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of declared lengths dropped for exceeding the frame limit
    pub fn oversized_frames(&self) -> u64 {
        self.oversized_frames
    }

    /// Bytes still missing before the next state transition
    pub fn bytes_needed(&self) -> usize {
        let target = match self.state {
            DecodeState::AwaitingLength => LENGTH_PREFIX_SIZE,
            DecodeState::AwaitingPayload { remaining } => remaining,
        };
        target.saturating_sub(self.buffer.len())
    }

    /// Feed a chunk and collect every payload it completes
    ///
    /// Leftover bytes stay buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(payload) = self.next_frame() {
            frames.push(payload);
        }
        frames
    }

    /// Advance the state machine until a payload completes or input runs out
    fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            match self.state {
                DecodeState::AwaitingLength => {
                    if self.buffer.len() < LENGTH_PREFIX_SIZE {
                        return None;
                    }

                    let length = self.buffer.get_u32() as usize;
                    if length > self.max_frame_size {
                        self.oversized_frames += 1;
                        tracing::warn!(
                            declared = length,
                            max = self.max_frame_size,
                            "Dropping oversized frame length"
                        );
                        continue;
                    }

                    self.state = DecodeState::AwaitingPayload { remaining: length };
                }
                DecodeState::AwaitingPayload { remaining } => {
                    if self.buffer.len() < remaining {
                        return None;
                    }

                    let payload = self.buffer.split_to(remaining).freeze();
                    self.state = DecodeState::AwaitingLength;
                    return Some(payload);
                }
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
