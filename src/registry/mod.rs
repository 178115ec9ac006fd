//! Stream presence registry
//!
//! Tracks which producers are live and which capture sources they are
//! sending. The registry stores presence only; frames never pass through it.
//!
//! ```text
//!                    StreamRegistry
//!          ┌──────────────────────────────────┐
//!          │ entries: HashMap<ClientId,        │
//!          │   PresenceEntry {                 │
//!          │     screen: bool,                 │
//!          │     webcam: bool,                 │
//!          │   }                               │
//!          │ >                                 │
//!          │ revision: u64                     │
//!          └───────────────┬──────────────────┘
//!                          │ set_active() → PresenceSnapshot
//!                          ▼
//!                     Broadcaster ──► viewers
//! ```
//!
//! An entry exists only while at least one of its kinds is active. Every
//! mutation bumps the revision and returns the resulting snapshot, so the
//! broadcaster can tell newer presence from older.

pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use entry::{PresenceEntry, PresenceSnapshot, StreamSummary};
pub use error::RegistryError;
pub use frame::{ClientId, Frame, StreamKind};
pub use store::StreamRegistry;
