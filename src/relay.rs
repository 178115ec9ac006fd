//! Shared relay state
//!
//! [`Relay`] pairs the presence registry with the broadcaster so that every
//! presence change is published, and hands out [`StreamLease`]s that keep a
//! stream marked live for exactly as long as the lease exists.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::{Broadcaster, ViewerHandle, ViewerId};
use crate::registry::{ClientId, Frame, PresenceSnapshot, StreamKind, StreamRegistry};
use crate::stats::RelayStats;

/// Registry plus broadcaster, shared by all connection tasks
pub struct Relay {
    registry: StreamRegistry,
    broadcaster: Broadcaster,
    next_session_id: AtomicU64,
    created_at: Instant,
}

impl Relay {
    /// Create a relay with the default viewer queue depth
    pub fn new() -> Self {
        Self::with_broadcaster(Broadcaster::new())
    }

    /// Create a relay with a custom viewer queue depth
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self::with_broadcaster(Broadcaster::with_queue_capacity(queue_capacity))
    }

    fn with_broadcaster(broadcaster: Broadcaster) -> Self {
        Self {
            registry: StreamRegistry::new(),
            broadcaster,
            next_session_id: AtomicU64::new(1),
            created_at: Instant::now(),
        }
    }

    /// Allocate a producer session id
    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Mark a stream live and return the lease that will mark it gone
    ///
    /// The presence change is published before this returns, so viewers see
    /// the stream before any of its frames.
    pub fn activate(self: &Arc<Self>, client_id: ClientId, kind: StreamKind) -> StreamLease {
        self.set_active(&client_id, kind, true);
        StreamLease {
            relay: Arc::clone(self),
            client_id,
            kind,
            released: false,
        }
    }

    /// Change presence and publish the resulting snapshot
    pub fn set_active(
        &self,
        client_id: &ClientId,
        kind: StreamKind,
        active: bool,
    ) -> PresenceSnapshot {
        let snapshot = self.registry.set_active(client_id, kind, active);
        self.broadcaster.publish_presence(&snapshot);
        snapshot
    }

    /// Fan a frame out to all viewers; returns how many accepted it
    pub fn publish_frame(&self, frame: &Frame) -> usize {
        self.broadcaster.publish_frame(frame)
    }

    /// Add a viewer; its first message is the current presence
    pub fn subscribe(&self) -> ViewerHandle {
        self.broadcaster.subscribe(&self.registry.snapshot())
    }

    /// Queue the current presence again for a viewer that asked for it
    pub fn refresh(&self, id: ViewerId) -> bool {
        self.broadcaster.resend_presence(id, &self.registry.snapshot())
    }

    /// Remove a viewer
    pub fn unsubscribe(&self, id: ViewerId) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    /// Current presence of every live producer
    pub fn presence(&self) -> PresenceSnapshot {
        self.registry.snapshot()
    }

    /// Whether a specific stream is live
    pub fn is_active(&self, client_id: &ClientId, kind: StreamKind) -> bool {
        self.registry.is_active(client_id, kind)
    }

    /// Number of subscribed viewers
    pub fn viewer_count(&self) -> usize {
        self.broadcaster.viewer_count()
    }

    /// Relay-wide statistics
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            active_producers: self.registry.client_count(),
            active_streams: self.registry.stream_count(),
            total_producer_sessions: self.next_session_id.load(Ordering::Relaxed) - 1,
            broadcast: self.broadcaster.stats(),
            uptime_secs: self.created_at.elapsed().as_secs(),
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps one (client, kind) stream marked live
///
/// Released exactly once: explicitly through [`StreamLease::release`], or on
/// drop if the owning task is cancelled first.
pub struct StreamLease {
    relay: Arc<Relay>,
    client_id: ClientId,
    kind: StreamKind,
    released: bool,
}

impl StreamLease {
    /// Client this lease belongs to
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Stream kind this lease belongs to
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Publish a frame for this stream
    pub fn publish(&self, payload: bytes::Bytes) -> usize {
        let frame = Frame::new(self.client_id.clone(), self.kind, payload);
        self.relay.publish_frame(&frame)
    }

    /// Mark the stream gone
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.relay.set_active(&self.client_id, self.kind, false);
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for StreamLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLease")
            .field("client_id", &self.client_id)
            .field("kind", &self.kind)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::broadcast::ViewerMessage;

    fn id(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    fn next(viewer: &mut ViewerHandle) -> ViewerMessage {
        serde_json::from_str(&viewer.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn test_late_viewer_sees_active_producers() {
        let relay = Arc::new(Relay::new());
        let _a = relay.activate(id("a"), StreamKind::Screen);
        let _b = relay.activate(id("b"), StreamKind::Webcam);

        let mut viewer = relay.subscribe();
        match next(&mut viewer) {
            ViewerMessage::Streams { streams } => {
                let ids: Vec<&str> = streams.iter().map(|s| s.client_id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
                assert!(streams[0].has_screen && !streams[0].has_webcam);
                assert!(!streams[1].has_screen && streams[1].has_webcam);
            }
            other => panic!("expected presence, got {:?}", other),
        }
    }

    #[test]
    fn test_presence_precedes_frames_and_follows_release() {
        let relay = Arc::new(Relay::new());
        let mut viewer = relay.subscribe();
        next(&mut viewer);

        let lease = relay.activate(id("a"), StreamKind::Screen);
        lease.publish(Bytes::from_static(b"jpeg"));
        lease.release();

        assert!(matches!(
            next(&mut viewer),
            ViewerMessage::Streams { streams } if streams.len() == 1
        ));
        assert!(matches!(next(&mut viewer), ViewerMessage::Frame { .. }));
        assert!(matches!(
            next(&mut viewer),
            ViewerMessage::Streams { streams } if streams.is_empty()
        ));
        assert!(viewer.try_recv().is_none());
    }

    #[test]
    fn test_refresh_never_overtakes_queued_presence() {
        let relay = Arc::new(Relay::new());
        let mut viewer = relay.subscribe();
        next(&mut viewer);

        let _a = relay.activate(id("a"), StreamKind::Screen);
        let _b = relay.activate(id("b"), StreamKind::Screen);
        assert!(relay.refresh(viewer.id()));

        let counts: Vec<usize> = std::iter::from_fn(|| viewer.try_recv())
            .map(|m| match serde_json::from_str::<ViewerMessage>(&m).unwrap() {
                ViewerMessage::Streams { streams } => streams.len(),
                other => panic!("expected presence, got {:?}", other),
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 2]);

        relay.unsubscribe(viewer.id());
        assert!(!relay.refresh(viewer.id()));
    }

    #[test]
    fn test_lease_drop_releases_once() {
        let relay = Arc::new(Relay::new());
        let a = id("a");

        {
            let _lease = relay.activate(a.clone(), StreamKind::Webcam);
            assert!(relay.is_active(&a, StreamKind::Webcam));
        }
        assert!(!relay.is_active(&a, StreamKind::Webcam));

        // Explicit release followed by drop must not deactivate twice
        let _other = relay.activate(a.clone(), StreamKind::Screen);
        let lease = relay.activate(a.clone(), StreamKind::Webcam);
        let before = relay.presence().revision;
        lease.release();
        assert_eq!(relay.presence().revision, before + 1);
        assert!(relay.is_active(&a, StreamKind::Screen));
    }

    #[test]
    fn test_stats_track_sessions_and_viewers() {
        let relay = Arc::new(Relay::new());
        relay.next_session_id();
        relay.next_session_id();
        let _lease = relay.activate(id("a"), StreamKind::Screen);
        let _viewer = relay.subscribe();

        let stats = relay.stats();
        assert_eq!(stats.total_producer_sessions, 2);
        assert_eq!(stats.active_producers, 1);
        assert_eq!(stats.active_streams, 1);
        assert_eq!(stats.broadcast.viewers, 1);
    }
}
