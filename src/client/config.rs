//! Producer client configuration

use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;
use crate::registry::{ClientId, StreamKind};

/// Default relay base URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Default pacing between frames (10 FPS)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Frames queued towards the HTTP body before `send_frame` waits
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Producer client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base URL, e.g. `http://localhost:3000`
    pub server_url: String,

    /// Which stream this upload carries
    pub kind: StreamKind,

    /// Identity shared by this producer's screen and webcam uploads
    pub client_id: ClientId,

    /// Pacing used by [`FramePublisher::run_paced`](super::FramePublisher::run_paced)
    pub frame_interval: Duration,

    /// Depth of the frame queue feeding the request body
    pub channel_capacity: usize,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Create a config with a fresh random client id
    pub fn new(server_url: impl Into<String>, kind: StreamKind) -> Self {
        Self {
            server_url: server_url.into(),
            kind,
            client_id: ClientId::random(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Use a specific client id
    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = client_id;
        self
    }

    /// Set frame pacing
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the frame queue depth
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// `{server}/stream/{kind}?clientId={id}`
    pub fn upload_url(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.server_url.clone()))?
            .pop_if_empty()
            .extend(["stream", self.kind.as_str()]);
        url.query_pairs_mut()
            .clear()
            .append_pair("clientId", self.client_id.as_str());

        Ok(url)
    }
}
