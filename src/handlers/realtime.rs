//! Server-sent-events handler for live store updates.

use axum::{
    extract::{Query, State},
    response::sse::{KeepAlive, Sse},
};
use serde::Deserialize;

use crate::realtime::sse_stream;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Optional collection prefix, e.g. `chats/abc123` to watch one
    /// conversation or `groups` to watch all group activity.
    #[serde(default)]
    pub collection: Option<String>,
}

/// GET /api/events?collection=...
pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl futures_util::Stream<Item = Result<axum::response::sse::Event, std::convert::Infallible>>>
{
    let rx = state.store.subscribe();
    Sse::new(sse_stream(rx, query.collection)).keep_alive(KeepAlive::default())
}
