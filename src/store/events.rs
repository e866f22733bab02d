//! Store change events.
//!
//! Every committed write to the document store publishes one `StoreEvent`
//! per touched document on a `tokio::sync::broadcast` channel. The realtime
//! feed forwards these to connected clients; library callers can subscribe
//! directly via [`crate::store::DocumentStore::subscribe`].

use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast sender for store events.
pub type StoreEventBroadcast = broadcast::Sender<StoreEvent>;

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEventKind {
    Created,
    Updated,
    Deleted,
}

/// A change notification for a single document.
///
/// Events carry only the document's address, not its body. Consumers that
/// need the new state re-read it, which keeps the channel cheap and avoids
/// delivering stale snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct StoreEvent {
    pub collection: String,
    pub id: String,
    pub kind: StoreEventKind,
}

impl StoreEvent {
    pub fn new(collection: impl Into<String>, id: impl Into<String>, kind: StoreEventKind) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            kind,
        }
    }
}
