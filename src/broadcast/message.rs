//! Viewer wire messages
//!
//! Both outbound shapes are JSON text:
//!
//! ```text
//! {"type":"streams","streams":[{"clientId":"..","hasScreen":true,"hasWebcam":false}]}
//! {"type":"frame","clientId":"..","streamType":"screen","data":"<base64>"}
//! ```

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::registry::{ClientId, Frame, PresenceSnapshot, StreamKind, StreamSummary};

/// Serialized message shared by every viewer queue
pub type EncodedMessage = Arc<str>;

/// Message pushed to viewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ViewerMessage {
    /// Full presence snapshot
    Streams { streams: Vec<StreamSummary> },

    /// One frame, base64 encoded
    #[serde(rename_all = "camelCase")]
    Frame {
        client_id: ClientId,
        stream_type: StreamKind,
        data: String,
    },
}

impl ViewerMessage {
    /// Build a presence message
    pub fn streams(snapshot: &PresenceSnapshot) -> Self {
        ViewerMessage::Streams {
            streams: snapshot.streams.clone(),
        }
    }

    /// Build a frame message
    pub fn frame(frame: &Frame) -> Self {
        ViewerMessage::Frame {
            client_id: frame.client_id.clone(),
            stream_type: frame.kind,
            data: BASE64.encode(&frame.payload),
        }
    }

    /// Serialize to shared JSON text
    pub fn encode(&self) -> Result<EncodedMessage, serde_json::Error> {
        serde_json::to_string(self).map(Arc::from)
    }

    /// Decode the payload of a frame message
    pub fn frame_payload(&self) -> Option<Vec<u8>> {
        match self {
            ViewerMessage::Frame { data, .. } => BASE64.decode(data).ok(),
            ViewerMessage::Streams { .. } => None,
        }
    }
}

/// Message a viewer may send to the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerRequest {
    /// Re-send the current presence snapshot
    Refresh,
}

#[derive(Deserialize)]
struct TaggedRequest {
    #[serde(rename = "type")]
    kind: String,
}

impl ViewerRequest {
    /// Parse inbound text; accepts `refresh` or `{"type":"refresh"}`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "refresh" {
            return Some(ViewerRequest::Refresh);
        }

        match serde_json::from_str::<TaggedRequest>(text) {
            Ok(request) if request.kind == "refresh" => Some(ViewerRequest::Refresh),
            _ => None,
        }
    }
}
