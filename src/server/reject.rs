//! HTTP rejections for producer uploads
//!
//! Every rejection is a plain-text body with a status code; nothing is
//! registered when a request is rejected up front.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::registry::RegistryError;
use crate::session::TerminationReason;

/// Why a producer upload was refused or cut short
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// `clientId` query parameter missing
    #[error("Missing clientId")]
    MissingClientId,

    /// `clientId` present but empty, or path kind not recognised
    #[error(transparent)]
    Invalid(#[from] RegistryError),

    /// Connection limit reached
    #[error("Too many connections")]
    Busy,

    /// Upload went quiet for longer than the idle timeout
    #[error("Idle timeout")]
    IdleTimeout,

    /// Reading the upload body failed
    #[error("Stream error")]
    Transport,
}

impl RejectReason {
    /// HTTP status for this rejection
    pub fn status(&self) -> StatusCode {
        match self {
            RejectReason::MissingClientId | RejectReason::Invalid(_) => StatusCode::BAD_REQUEST,
            RejectReason::Busy => StatusCode::SERVICE_UNAVAILABLE,
            RejectReason::IdleTimeout => StatusCode::REQUEST_TIMEOUT,
            RejectReason::Transport => StatusCode::BAD_REQUEST,
        }
    }

    /// Map how a session ended to the response it gets, if it failed
    pub fn from_termination(reason: TerminationReason) -> Option<Self> {
        match reason {
            TerminationReason::EndOfStream => None,
            TerminationReason::IdleTimeout => Some(RejectReason::IdleTimeout),
            TerminationReason::TransportError | TerminationReason::Aborted => {
                Some(RejectReason::Transport)
            }
        }
    }
}

impl IntoResponse for RejectReason {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
