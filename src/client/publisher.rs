//! Frame publisher
//!
//! Streams length-prefixed frames to a relay over one long-lived POST.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;

use super::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::encode_frame;

/// 1x1 grey baseline JPEG, sent when a capture source has nothing yet
pub const PLACEHOLDER_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
    0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43,
    0x00, 0x08, 0x06, 0x06, 0x07, 0x06, 0x05, 0x08, 0x07, 0x07, 0x07, 0x09,
    0x09, 0x08, 0x0A, 0x0C, 0x14, 0x0D, 0x0C, 0x0B, 0x0B, 0x0C, 0x19, 0x12,
    0x13, 0x0F, 0x14, 0x1D, 0x1A, 0x1F, 0x1E, 0x1D, 0x1A, 0x1C, 0x1C, 0x20,
    0x24, 0x2E, 0x27, 0x20, 0x22, 0x2C, 0x23, 0x1C, 0x1C, 0x28, 0x37, 0x29,
    0x2C, 0x30, 0x31, 0x34, 0x34, 0x34, 0x1F, 0x27, 0x39, 0x3D, 0x38, 0x32,
    0x3C, 0x2E, 0x33, 0x34, 0x32, 0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01,
    0x00, 0x01, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00, 0x1F, 0x00, 0x00,
    0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
    0x08, 0x09, 0x0A, 0x0B, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00,
    0x3F, 0x00, 0x7B, 0xDF, 0xFF, 0xD9,
];

type BodyChunk = std::result::Result<Bytes, std::io::Error>;

/// Producer-side upload of one stream
///
/// # Example
/// ```no_run
/// use frame_relay::client::{ClientConfig, FramePublisher};
/// use frame_relay::registry::StreamKind;
///
/// # async fn example() -> frame_relay::Result<()> {
/// let config = ClientConfig::new("http://localhost:3000", StreamKind::Screen);
/// let mut publisher = FramePublisher::connect(config)?;
///
/// publisher.send_frame(b"...jpeg bytes...").await?;
/// let status = publisher.finish().await?;
/// println!("relay answered {}", status);
/// # Ok(())
/// # }
/// ```
pub struct FramePublisher {
    config: ClientConfig,
    body_tx: Option<mpsc::Sender<BodyChunk>>,
    response: Option<JoinHandle<reqwest::Result<reqwest::Response>>>,
    frames_sent: u64,
    bytes_sent: u64,
}

impl FramePublisher {
    /// Open the upload
    ///
    /// The request is sent in the background; frames flow into its body as
    /// they are queued. Must be called inside a tokio runtime.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let url = config.upload_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::from)?;

        let (body_tx, body_rx) = mpsc::channel::<BodyChunk>(config.channel_capacity);
        let request = client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(ReceiverStream::new(body_rx)));

        tracing::info!(
            url = %url,
            client_id = %config.client_id,
            kind = %config.kind,
            "Opening upload"
        );
        let response = tokio::spawn(async move { request.send().await });

        Ok(Self {
            config,
            body_tx: Some(body_tx),
            response: Some(response),
            frames_sent: 0,
            bytes_sent: 0,
        })
    }

    /// Configuration this publisher was opened with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Queue one frame
    ///
    /// Fails with [`ClientError::Closed`] once the relay has stopped reading
    /// the body; [`finish`](Self::finish) then reports why.
    pub async fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        let chunk = encode_frame(payload)?;
        let body_tx = self.body_tx.as_ref().ok_or(ClientError::Closed)?;
        let len = chunk.len() as u64;

        body_tx
            .send(Ok(chunk))
            .await
            .map_err(|_| ClientError::Closed)?;

        self.frames_sent += 1;
        self.bytes_sent += len;
        tracing::trace!(size = payload.len(), frames = self.frames_sent, "Frame queued");
        Ok(())
    }

    /// Send frames from `source` at the configured interval
    ///
    /// `source` returning `None` or an empty frame sends [`PLACEHOLDER_JPEG`]
    /// instead. Stops after `limit` frames when given, otherwise runs until
    /// the upload closes.
    pub async fn run_paced<F>(&mut self, mut source: F, limit: Option<u64>) -> Result<u64>
    where
        F: FnMut() -> Option<Bytes>,
    {
        let mut ticker = tokio::time::interval(self.config.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent = 0u64;

        while limit.map_or(true, |limit| sent < limit) {
            ticker.tick().await;
            let frame = source()
                .filter(|frame| !frame.is_empty())
                .unwrap_or_else(|| Bytes::from_static(PLACEHOLDER_JPEG));
            self.send_frame(&frame).await?;
            sent += 1;
        }

        Ok(sent)
    }

    /// Close the body and wait for the relay's answer
    pub async fn finish(mut self) -> Result<StatusCode> {
        self.body_tx.take();
        let handle = self.response.take().ok_or(ClientError::Closed)?;

        let response = handle
            .await
            .map_err(|_| ClientError::Closed)?
            .map_err(ClientError::from)?;
        let status = response.status();

        tracing::info!(
            status = status.as_u16(),
            frames = self.frames_sent,
            bytes = self.bytes_sent,
            "Upload finished"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(status)
    }

    /// Frames queued so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Wire bytes queued so far, prefixes included
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Whether frames can still be queued
    pub fn is_connected(&self) -> bool {
        self.body_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
