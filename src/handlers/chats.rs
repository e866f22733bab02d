//! Direct-conversation handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::{self, ConversationKind, DirectChat, Message};
use crate::directory;
use crate::error::{ChatError, ChatResult};
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    /// Username of the other participant.
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub text: String,
}

/// A conversation with its document id attached, as list endpoints return it.
#[derive(Debug, Serialize)]
pub struct ChatEnvelope {
    pub id: String,
    #[serde(flatten)]
    pub chat: DirectChat,
}

fn require_participant(chat: &DirectChat, uid: &str) -> ChatResult<()> {
    if chat.participants.iter().any(|p| p == uid) {
        Ok(())
    } else {
        Err(ChatError::forbidden("not a participant of this chat"))
    }
}

/// POST /api/chats
///
/// Finds or creates the direct conversation with the named user.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateChatRequest>,
) -> ChatResult<Json<ChatEnvelope>> {
    let other = directory::lookup_by_username(&state.store, &request.username).await?;
    let id = chat::find_or_create_direct(&state.store, &auth.uid, &other.uid).await?;
    let chat = chat::direct_chat(&state.store, &id).await?;
    Ok(Json(ChatEnvelope { id, chat }))
}

/// GET /api/chats
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> ChatResult<Json<Vec<ChatEnvelope>>> {
    let chats = chat::chats_for_user(&state.store, &auth.uid).await?;
    Ok(Json(
        chats
            .into_iter()
            .map(|(id, chat)| ChatEnvelope { id, chat })
            .collect(),
    ))
}

/// GET /api/chats/{chat_id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(chat_id): Path<String>,
) -> ChatResult<Json<ChatEnvelope>> {
    let chat = chat::direct_chat(&state.store, &chat_id).await?;
    require_participant(&chat, &auth.uid)?;
    Ok(Json(ChatEnvelope { id: chat_id, chat }))
}

/// GET /api/chats/{chat_id}/messages
pub async fn messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(chat_id): Path<String>,
) -> ChatResult<Json<Vec<Message>>> {
    let chat = chat::direct_chat(&state.store, &chat_id).await?;
    require_participant(&chat, &auth.uid)?;
    let messages = chat::list_messages(&state.store, ConversationKind::Direct, &chat_id).await?;
    Ok(Json(messages))
}

/// POST /api/chats/{chat_id}/messages
pub async fn send(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(chat_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ChatResult<Json<Message>> {
    let sender = directory::lookup_by_id(&state.store, &auth.uid).await?;
    let message = chat::send_message(
        &state.store,
        ConversationKind::Direct,
        &chat_id,
        &sender,
        &request.text,
        request.reply_to.as_deref(),
    )
    .await?;
    Ok(Json(message))
}

/// POST /api/chats/{chat_id}/read
///
/// Marks every message the caller has not read yet. Idempotent.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(chat_id): Path<String>,
) -> ChatResult<Json<serde_json::Value>> {
    let chat = chat::direct_chat(&state.store, &chat_id).await?;
    require_participant(&chat, &auth.uid)?;
    chat::mark_read(&state.store, ConversationKind::Direct, &chat_id, &auth.uid).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// PATCH /api/chats/{chat_id}/messages/{message_id}
pub async fn edit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((chat_id, message_id)): Path<(String, String)>,
    Json(request): Json<EditMessageRequest>,
) -> ChatResult<Json<Message>> {
    let message = chat::edit_message(
        &state.store,
        ConversationKind::Direct,
        &chat_id,
        &auth.uid,
        &message_id,
        &request.text,
    )
    .await?;
    Ok(Json(message))
}

/// DELETE /api/chats/{chat_id}/messages/{message_id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((chat_id, message_id)): Path<(String, String)>,
) -> ChatResult<Json<serde_json::Value>> {
    chat::delete_message(
        &state.store,
        ConversationKind::Direct,
        &chat_id,
        &auth.uid,
        &message_id,
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
