//! Stream registry implementation
//!
//! The single shared map of producer presence. All access goes through the
//! methods below; the map itself never leaves this module.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::entry::{PresenceEntry, PresenceSnapshot, StreamSummary};
use super::frame::{ClientId, StreamKind};

struct RegistryInner {
    entries: HashMap<ClientId, PresenceEntry>,
    /// Bumped on every mutation
    revision: u64,
    /// Next insertion sequence number
    next_seq: u64,
}

impl RegistryInner {
    fn snapshot(&self) -> PresenceSnapshot {
        let mut rows: Vec<(&ClientId, &PresenceEntry)> = self.entries.iter().collect();
        rows.sort_by_key(|(_, entry)| entry.seq);

        PresenceSnapshot {
            revision: self.revision,
            streams: rows
                .into_iter()
                .map(|(id, entry)| StreamSummary::from_entry(id, entry))
                .collect(),
        }
    }
}

/// Central presence registry
///
/// Guarded by a plain `std::sync::Mutex`: every operation is a short,
/// non-blocking critical section, and deactivation has to work from `Drop`
/// where there is no runtime to await on.
pub struct StreamRegistry {
    inner: Mutex<RegistryInner>,
}

impl StreamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                entries: HashMap::new(),
                revision: 0,
                next_seq: 0,
            }),
        }
    }

    // Each mutation is a single map operation, so a poisoned lock still
    // guards consistent data.
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark one stream kind of a producer live or gone
    ///
    /// Activating creates the entry if needed; deactivating the last live
    /// kind removes the entry. Every call is a presence change and returns
    /// the snapshot it produced.
    pub fn set_active(
        &self,
        client_id: &ClientId,
        kind: StreamKind,
        active: bool,
    ) -> PresenceSnapshot {
        let mut inner = self.lock();
        inner.revision += 1;

        if active {
            if !inner.entries.contains_key(client_id) {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.entries.insert(client_id.clone(), PresenceEntry::new(seq));
                tracing::info!(client_id = %client_id, "Producer registered");
            }
            if let Some(entry) = inner.entries.get_mut(client_id) {
                entry.set(kind, true);
            }
        } else {
            let now_empty = match inner.entries.get_mut(client_id) {
                Some(entry) => {
                    entry.set(kind, false);
                    entry.is_empty()
                }
                None => false,
            };
            if now_empty {
                inner.entries.remove(client_id);
                tracing::info!(client_id = %client_id, "Producer removed");
            }
        }

        tracing::debug!(
            client_id = %client_id,
            kind = %kind,
            active = active,
            revision = inner.revision,
            "Presence changed"
        );

        inner.snapshot()
    }

    /// Current presence of every live producer
    pub fn snapshot(&self) -> PresenceSnapshot {
        self.lock().snapshot()
    }

    /// Whether a specific stream is live
    pub fn is_active(&self, client_id: &ClientId, kind: StreamKind) -> bool {
        self.lock()
            .entries
            .get(client_id)
            .is_some_and(|entry| entry.is_active(kind))
    }

    /// Number of producers with at least one live stream
    pub fn client_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Number of live (producer, kind) streams
    pub fn stream_count(&self) -> usize {
        self.lock()
            .entries
            .values()
            .map(PresenceEntry::active_count)
            .sum()
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
