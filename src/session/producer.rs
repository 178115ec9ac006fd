//! Producer session
//!
//! Drives one upload: registers the stream, feeds body chunks through the
//! connection's own decoder, publishes frames in the order they complete,
//! and deregisters exactly once however the connection ends.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::context::ProducerContext;
use super::state::{ConnectionPhase, ConnectionState, TerminationReason};
use crate::protocol::FrameDecoder;
use crate::relay::{Relay, StreamLease};
use crate::stats::ProducerStats;

/// State owned by one producer connection
///
/// Dropping a session that has not terminated (for example when the HTTP
/// server cancels the handler because the client vanished) terminates it
/// with [`TerminationReason::Aborted`].
pub struct ProducerSession {
    context: ProducerContext,
    state: ConnectionState,
    decoder: FrameDecoder,
    stats: ProducerStats,
    relay: Arc<Relay>,
    lease: Option<StreamLease>,
}

impl ProducerSession {
    /// Create an idle session
    pub fn new(relay: Arc<Relay>, context: ProducerContext, max_frame_size: usize) -> Self {
        Self {
            context,
            state: ConnectionState::new(),
            decoder: FrameDecoder::with_max_frame_size(max_frame_size),
            stats: ProducerStats::new(),
            relay,
            lease: None,
        }
    }

    /// Connection identity
    pub fn context(&self) -> &ProducerContext {
        &self.context
    }

    /// Current phase
    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase
    }

    /// Why the session ended, once it has
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.state.reason
    }

    /// Session statistics so far
    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    /// Time from accept to termination, once terminated
    pub fn lifetime(&self) -> Option<Duration> {
        self.state.lifetime()
    }

    /// Register the stream and start accepting chunks
    ///
    /// Returns false if the session was not idle.
    pub fn register(&mut self) -> bool {
        if !self.state.register() {
            return false;
        }

        self.lease = Some(
            self.relay
                .activate(self.context.client_id.clone(), self.context.kind),
        );

        tracing::info!(
            session_id = self.context.session_id,
            client_id = %self.context.client_id,
            kind = %self.context.kind,
            peer = ?self.context.peer_addr,
            "Producer stream started"
        );

        self.state.start_streaming()
    }

    /// Feed one transport chunk; returns the number of frames published
    pub fn on_chunk(&mut self, chunk: &[u8]) -> usize {
        if !self.state.is_streaming() {
            return 0;
        }
        let Some(lease) = self.lease.as_ref() else {
            return 0;
        };

        self.stats.on_chunk(chunk.len());
        let frames = self.decoder.feed(chunk);
        let count = frames.len();

        for payload in frames {
            self.stats.on_frame(payload.len());
            lease.publish(payload);
        }
        self.stats.oversized_frames = self.decoder.oversized_frames();

        count
    }

    /// Move to `Terminated` and deregister the stream
    ///
    /// Only the first call has any effect.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        if !self.state.terminate(reason) {
            return false;
        }

        if let Some(lease) = self.lease.take() {
            lease.release();
        }

        tracing::info!(
            session_id = self.context.session_id,
            client_id = %self.context.client_id,
            kind = %self.context.kind,
            reason = %reason,
            chunks = self.stats.chunks_received,
            bytes = self.stats.bytes_received,
            frames = self.stats.frames,
            frame_bytes = self.stats.frame_bytes,
            largest_frame = self.stats.largest_frame,
            oversized = self.stats.oversized_frames,
            leftover = self.decoder.buffered(),
            duration_ms = self.lifetime().unwrap_or_default().as_millis() as u64,
            fps = self.stats.frame_rate(),
            bitrate = self.stats.bitrate(),
            "Producer stream ended"
        );

        true
    }

    /// Run the session over a body stream until it ends
    ///
    /// With `idle_timeout` set, a gap between chunks longer than the timeout
    /// ends the session.
    pub async fn run<S, E>(mut self, body: S, idle_timeout: Option<Duration>) -> TerminationReason
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        self.register();
        let mut body = std::pin::pin!(body);

        let reason = loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, body.next()).await {
                    Ok(next) => next,
                    Err(_) => break TerminationReason::IdleTimeout,
                },
                None => body.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    self.on_chunk(&chunk);
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        session_id = self.context.session_id,
                        client_id = %self.context.client_id,
                        error = %e,
                        "Producer body error"
                    );
                    break TerminationReason::TransportError;
                }
                None => break TerminationReason::EndOfStream,
            }
        };

        self.terminate(reason);
        reason
    }
}

impl Drop for ProducerSession {
    fn drop(&mut self) {
        self.terminate(TerminationReason::Aborted);
    }
}
