//! Global chat room handlers.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::chat::{self, Message};
use crate::directory;
use crate::error::ChatResult;
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SendGlobalRequest {
    pub text: String,
}

/// GET /api/global?limit=N
///
/// Most recent messages first; the limit is clamped server-side.
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ChatResult<Json<Vec<Message>>> {
    let messages = chat::recent_global(&state.store, query.limit).await?;
    Ok(Json(messages))
}

/// POST /api/global
pub async fn send(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<SendGlobalRequest>,
) -> ChatResult<Json<Message>> {
    let sender = directory::lookup_by_id(&state.store, &auth.uid).await?;
    let message = chat::send_global(&state.store, &sender, &request.text).await?;
    Ok(Json(message))
}
