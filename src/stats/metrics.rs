//! Statistics and metrics for relay sessions

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::broadcast::BroadcastStats;

/// Per-connection producer statistics
#[derive(Debug, Clone)]
pub struct ProducerStats {
    /// When the connection was accepted
    pub started_at: Instant,
    /// Transport chunks read
    pub chunks_received: u64,
    /// Total body bytes read
    pub bytes_received: u64,
    /// Complete frames decoded and published
    pub frames: u64,
    /// Payload bytes across all frames
    pub frame_bytes: u64,
    /// Declared lengths dropped for exceeding the frame limit
    pub oversized_frames: u64,
    /// Size of the largest frame seen
    pub largest_frame: usize,
}

impl ProducerStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            chunks_received: 0,
            bytes_received: 0,
            frames: 0,
            frame_bytes: 0,
            oversized_frames: 0,
            largest_frame: 0,
        }
    }

    /// Record one transport chunk
    pub fn on_chunk(&mut self, size: usize) {
        self.chunks_received += 1;
        self.bytes_received += size as u64;
    }

    /// Record one decoded frame
    pub fn on_frame(&mut self, size: usize) {
        self.frames += 1;
        self.frame_bytes += size as u64;
        self.largest_frame = self.largest_frame.max(size);
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Frames per second over the whole session
    pub fn frame_rate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    /// Bitrate in bits per second over the whole session
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_received * 8) / secs
        } else {
            0
        }
    }
}

impl Default for ProducerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Relay-wide statistics, served at `/stats`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    /// Producers with at least one live stream
    pub active_producers: usize,
    /// Live (producer, kind) streams
    pub active_streams: usize,
    /// Producer connections accepted since start
    pub total_producer_sessions: u64,
    /// Broadcaster counters
    #[serde(flatten)]
    pub broadcast: BroadcastStats,
    /// Time since the relay was created
    pub uptime_secs: u64,
}
