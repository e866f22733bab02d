//! Realtime event delivery.
//!
//! The store's broadcast channel wrapped into a server-sent-events stream,
//! with an optional collection-prefix filter so a chat screen can watch
//! only its own conversation. A client that disconnects drops its receiver
//! and the subscription with it.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::store::StoreEvent;

/// Wrap a store event receiver into an SSE event stream.
///
/// Events whose collection does not start with `collection_prefix` are
/// filtered out. Lagged receivers skip missed events and keep going;
/// clients are expected to re-read on reconnect anyway.
pub fn sse_stream(
    rx: broadcast::Receiver<StoreEvent>,
    collection_prefix: Option<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(move |result| {
        let prefix = collection_prefix.clone();
        async move {
            let event = match result {
                Ok(event) => event,
                // Lagged: the subscriber fell behind the channel capacity.
                Err(_) => return None,
            };
            if let Some(prefix) = &prefix {
                if !event.collection.starts_with(prefix.as_str()) {
                    return None;
                }
            }
            Event::default()
                .event("store")
                .json_data(&event)
                .ok()
                .map(Ok)
        }
    })
}
