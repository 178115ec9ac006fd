//! Broadcaster implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::message::{EncodedMessage, ViewerMessage};
use super::viewer::{ViewerHandle, ViewerId};
use crate::registry::{Frame, PresenceSnapshot};

/// Default per-viewer queue depth
pub const DEFAULT_VIEWER_QUEUE_CAPACITY: usize = 64;

struct HubInner {
    viewers: HashMap<ViewerId, mpsc::Sender<EncodedMessage>>,
    next_viewer_id: u64,
    /// Newest presence published so far, sent to every new viewer
    presence: PresenceSnapshot,
    presence_message: EncodedMessage,
}

/// Counters kept by the broadcaster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastStats {
    /// Currently subscribed viewers
    pub viewers: usize,
    /// Viewers ever subscribed
    pub total_viewers: u64,
    /// Frames published (independent of viewer count)
    pub frames_published: u64,
    /// Presence snapshots published
    pub presence_published: u64,
    /// Individual queue deliveries
    pub messages_delivered: u64,
    /// Viewers removed because their queue was full
    pub slow_viewers_dropped: u64,
}

/// Fan-out hub for frames and presence
///
/// Delivery is best effort and at most once per viewer per publish. A
/// publish never fails and never waits on a viewer.
pub struct Broadcaster {
    inner: Mutex<HubInner>,
    queue_capacity: usize,
    total_viewers: AtomicU64,
    frames_published: AtomicU64,
    presence_published: AtomicU64,
    messages_delivered: AtomicU64,
    slow_viewers_dropped: AtomicU64,
}

impl Broadcaster {
    /// Create a broadcaster with the default queue depth
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_VIEWER_QUEUE_CAPACITY)
    }

    /// Create a broadcaster with a custom per-viewer queue depth (minimum 1)
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        let presence = PresenceSnapshot::default();
        let presence_message = encode_or_empty(&ViewerMessage::streams(&presence));

        Self {
            inner: Mutex::new(HubInner {
                viewers: HashMap::new(),
                next_viewer_id: 1,
                presence,
                presence_message,
            }),
            queue_capacity: queue_capacity.max(1),
            total_viewers: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            presence_published: AtomicU64::new(0),
            messages_delivered: AtomicU64::new(0),
            slow_viewers_dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-viewer queue depth
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Add a viewer
    ///
    /// The viewer's queue starts with a presence message: `snapshot`, or the
    /// newest presence already published if that is more recent.
    pub fn subscribe(&self, snapshot: &PresenceSnapshot) -> ViewerHandle {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let mut inner = self.lock();

        if snapshot.revision > inner.presence.revision {
            inner.presence_message = encode_or_empty(&ViewerMessage::streams(snapshot));
            inner.presence = snapshot.clone();
        }

        let id = ViewerId(inner.next_viewer_id);
        inner.next_viewer_id += 1;

        // Fresh queue with capacity >= 1, cannot be full
        let _ = tx.try_send(inner.presence_message.clone());
        inner.viewers.insert(id, tx);
        let viewers = inner.viewers.len();
        drop(inner);

        self.total_viewers.fetch_add(1, Ordering::Relaxed);
        tracing::info!(viewer = %id, viewers = viewers, "Viewer subscribed");

        ViewerHandle::new(id, rx)
    }

    /// Remove a viewer; returns false if it was already gone
    pub fn unsubscribe(&self, id: ViewerId) -> bool {
        let mut inner = self.lock();
        let removed = inner.viewers.remove(&id).is_some();
        let viewers = inner.viewers.len();
        drop(inner);

        if removed {
            tracing::info!(viewer = %id, viewers = viewers, "Viewer unsubscribed");
        }
        removed
    }

    /// Deliver a frame to every viewer; returns how many queues accepted it
    pub fn publish_frame(&self, frame: &Frame) -> usize {
        self.frames_published.fetch_add(1, Ordering::Relaxed);

        // Work from a copy of the handle list so the lock is not held while
        // encoding or offering to queues.
        let targets: Vec<(ViewerId, mpsc::Sender<EncodedMessage>)> = {
            let inner = self.lock();
            if inner.viewers.is_empty() {
                return 0;
            }
            inner
                .viewers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let message = match ViewerMessage::frame(frame).encode() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    client_id = %frame.client_id,
                    error = %e,
                    "Failed to encode frame"
                );
                return 0;
            }
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, tx) in &targets {
            if self.offer(*id, tx, &message) {
                delivered += 1;
            } else {
                failed.push(*id);
            }
        }

        if !failed.is_empty() {
            let mut inner = self.lock();
            for id in &failed {
                inner.viewers.remove(id);
            }
        }

        tracing::trace!(
            client_id = %frame.client_id,
            kind = %frame.kind,
            size = frame.payload.len(),
            delivered = delivered,
            "Frame broadcast"
        );

        delivered
    }

    /// Deliver a presence snapshot to every viewer
    ///
    /// Snapshots older than the newest one already published are discarded,
    /// so viewers never step back to stale presence. Delivery happens under
    /// the hub lock to keep snapshot order identical across viewers.
    pub fn publish_presence(&self, snapshot: &PresenceSnapshot) -> usize {
        let mut inner = self.lock();

        if snapshot.revision < inner.presence.revision {
            tracing::debug!(
                revision = snapshot.revision,
                latest = inner.presence.revision,
                "Discarding stale presence"
            );
            return 0;
        }

        let message = match ViewerMessage::streams(snapshot).encode() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode presence");
                return 0;
            }
        };
        inner.presence = snapshot.clone();
        inner.presence_message = message.clone();
        self.presence_published.fetch_add(1, Ordering::Relaxed);

        let mut failed = Vec::new();
        for (id, tx) in &inner.viewers {
            if !self.offer(*id, tx, &message) {
                failed.push(*id);
            }
        }
        for id in &failed {
            inner.viewers.remove(id);
        }

        inner.viewers.len()
    }

    /// Queue the current presence again for one viewer
    ///
    /// `snapshot` is adopted first if it is newer than the last published
    /// one. The message goes through the viewer's queue, behind anything
    /// already waiting there. Returns false if the viewer is unknown or had
    /// to be dropped.
    pub fn resend_presence(&self, id: ViewerId, snapshot: &PresenceSnapshot) -> bool {
        let mut inner = self.lock();

        if snapshot.revision > inner.presence.revision {
            inner.presence_message = encode_or_empty(&ViewerMessage::streams(snapshot));
            inner.presence = snapshot.clone();
        }

        let Some(tx) = inner.viewers.get(&id) else {
            return false;
        };
        let message = inner.presence_message.clone();
        if self.offer(id, tx, &message) {
            tracing::debug!(
                viewer = %id,
                revision = inner.presence.revision,
                "Presence resent"
            );
            true
        } else {
            inner.viewers.remove(&id);
            false
        }
    }

    /// Try to enqueue without waiting; false means the viewer must be dropped
    fn offer(
        &self,
        id: ViewerId,
        tx: &mpsc::Sender<EncodedMessage>,
        message: &EncodedMessage,
    ) -> bool {
        match tx.try_send(message.clone()) {
            Ok(()) => {
                self.messages_delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.slow_viewers_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    viewer = %id,
                    capacity = self.queue_capacity,
                    "Viewer queue full, dropping slow viewer"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(viewer = %id, "Viewer gone, removing");
                false
            }
        }
    }

    /// Newest presence snapshot published
    pub fn latest_presence(&self) -> PresenceSnapshot {
        self.lock().presence.clone()
    }

    /// Number of subscribed viewers
    pub fn viewer_count(&self) -> usize {
        self.lock().viewers.len()
    }

    /// Current counters
    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            viewers: self.viewer_count(),
            total_viewers: self.total_viewers.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            presence_published: self.presence_published.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            slow_viewers_dropped: self.slow_viewers_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_or_empty(message: &ViewerMessage) -> EncodedMessage {
    message
        .encode()
        .unwrap_or_else(|_| EncodedMessage::from(r#"{"type":"streams","streams":[]}"#))
}
