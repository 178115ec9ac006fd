//! Presence entry and snapshot types

use serde::{Deserialize, Serialize};

use super::frame::{ClientId, StreamKind};

/// Presence of one producer
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    /// Screen stream is live
    pub screen: bool,
    /// Webcam stream is live
    pub webcam: bool,
    /// Insertion sequence, used to keep snapshots in first-seen order
    pub(super) seq: u64,
}

impl PresenceEntry {
    pub(super) fn new(seq: u64) -> Self {
        Self {
            screen: false,
            webcam: false,
            seq,
        }
    }

    /// Whether the given kind is live
    pub fn is_active(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Screen => self.screen,
            StreamKind::Webcam => self.webcam,
        }
    }

    pub(super) fn set(&mut self, kind: StreamKind, active: bool) {
        match kind {
            StreamKind::Screen => self.screen = active,
            StreamKind::Webcam => self.webcam = active,
        }
    }

    /// True once both kinds are inactive
    pub fn is_empty(&self) -> bool {
        !self.screen && !self.webcam
    }

    /// Number of live kinds
    pub fn active_count(&self) -> usize {
        usize::from(self.screen) + usize::from(self.webcam)
    }
}

/// One row of a presence snapshot, in viewer wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub client_id: ClientId,
    pub has_screen: bool,
    pub has_webcam: bool,
}

impl StreamSummary {
    pub(super) fn from_entry(client_id: &ClientId, entry: &PresenceEntry) -> Self {
        Self {
            client_id: client_id.clone(),
            has_screen: entry.screen,
            has_webcam: entry.webcam,
        }
    }
}

/// Full registry state at one revision
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceSnapshot {
    /// Registry revision this snapshot was taken at (0 = empty registry)
    pub revision: u64,
    /// Live producers, in first-seen order
    pub streams: Vec<StreamSummary>,
}

impl PresenceSnapshot {
    /// Look up one producer
    pub fn get(&self, client_id: &ClientId) -> Option<&StreamSummary> {
        self.streams.iter().find(|s| &s.client_id == client_id)
    }

    /// True if no producer is live
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
