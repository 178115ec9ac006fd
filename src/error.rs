//! Crate error types

use crate::server::config::ConfigError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
///
/// The relay core itself never fails: decoding is pure buffering and fan-out
/// swallows per-viewer failures. Errors only surface at the edges (binding a
/// listener, loading configuration, talking to a relay as a client).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or listener failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Producer client failure
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Errors raised by the producer client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The relay URL could not be used
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Frame is larger than the wire format allows
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// The upload ended before the frame could be queued
    #[error("Upload closed")]
    Closed,

    /// The relay answered with a non-success status
    #[error("Relay rejected upload: {status} {body}")]
    Rejected { status: u16, body: String },
}
