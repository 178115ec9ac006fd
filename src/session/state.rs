//! Connection state machine
//!
//! Tracks one producer connection from request to termination.

use std::fmt;
use std::time::{Duration, Instant};

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Request accepted, stream not registered yet
    Idle,
    /// Stream marked live in the registry
    Registered,
    /// Body is being decoded and frames published
    Streaming,
    /// Connection finished; terminal
    Terminated,
}

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Producer finished the request body
    EndOfStream,
    /// Reading the body failed
    TransportError,
    /// Handler was dropped before the body ended (client went away)
    Aborted,
    /// No data within the configured idle timeout
    IdleTimeout,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::EndOfStream => "end of stream",
            TerminationReason::TransportError => "transport error",
            TerminationReason::Aborted => "aborted",
            TerminationReason::IdleTimeout => "idle timeout",
        };
        f.write_str(s)
    }
}

/// Phase plus transition timestamps
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// Current phase
    pub phase: ConnectionPhase,
    /// Set on entering `Terminated`
    pub reason: Option<TerminationReason>,
    /// When the connection was accepted
    pub accepted_at: Instant,
    /// When the stream was registered
    pub registered_at: Option<Instant>,
    /// When the connection terminated
    pub terminated_at: Option<Instant>,
}

impl ConnectionState {
    /// Create a new connection state
    pub fn new() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            reason: None,
            accepted_at: Instant::now(),
            registered_at: None,
            terminated_at: None,
        }
    }

    /// `Idle → Registered`
    pub fn register(&mut self) -> bool {
        if self.phase != ConnectionPhase::Idle {
            return false;
        }
        self.phase = ConnectionPhase::Registered;
        self.registered_at = Some(Instant::now());
        true
    }

    /// `Registered → Streaming`
    pub fn start_streaming(&mut self) -> bool {
        if self.phase != ConnectionPhase::Registered {
            return false;
        }
        self.phase = ConnectionPhase::Streaming;
        true
    }

    /// Any phase → `Terminated`
    ///
    /// Returns false if the connection had already terminated; the first
    /// reason wins.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.phase = ConnectionPhase::Terminated;
        self.reason = Some(reason);
        self.terminated_at = Some(Instant::now());
        true
    }

    /// Check if the connection has terminated
    pub fn is_terminated(&self) -> bool {
        self.phase == ConnectionPhase::Terminated
    }

    /// Time from accept to termination, once terminated
    pub fn lifetime(&self) -> Option<Duration> {
        self.terminated_at.map(|end| end.saturating_duration_since(self.accepted_at))
    }

    /// Check if frames are being accepted
    pub fn is_streaming(&self) -> bool {
        self.phase == ConnectionPhase::Streaming
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
