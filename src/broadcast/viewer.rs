//! Viewer subscription handle

use std::fmt;

use tokio::sync::mpsc;

use super::message::EncodedMessage;

/// Opaque viewer identifier, unique for the broadcaster's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(pub(super) u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Receiving end of one viewer's queue
///
/// `recv` returns `None` once the broadcaster has dropped the viewer (or the
/// broadcaster itself is gone). Dropping the handle closes the queue and the
/// broadcaster forgets the viewer on its next publish.
#[derive(Debug)]
pub struct ViewerHandle {
    id: ViewerId,
    rx: mpsc::Receiver<EncodedMessage>,
}

impl ViewerHandle {
    pub(super) fn new(id: ViewerId, rx: mpsc::Receiver<EncodedMessage>) -> Self {
        Self { id, rx }
    }

    /// This viewer's id
    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Wait for the next message
    pub async fn recv(&mut self) -> Option<EncodedMessage> {
        self.rx.recv().await
    }

    /// Take the next message if one is already queued
    pub fn try_recv(&mut self) -> Option<EncodedMessage> {
        self.rx.try_recv().ok()
    }
}
