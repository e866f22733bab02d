//! The global chat room.
//!
//! A single flat collection of messages visible to every signed-in user.
//! There is no parent record, no membership, and no read tracking; the
//! screen shows the most recent messages only.

use crate::chat::types::Message;
use crate::directory::UserProfile;
use crate::error::{ChatError, ChatResult};
use crate::store::{DocumentStore, Order};

const GLOBAL_CHAT: &str = "globalChat";

/// Default number of recent messages returned.
pub const GLOBAL_DEFAULT_LIMIT: i64 = 50;

/// Post a message to the global room.
pub async fn send_global(
    store: &DocumentStore,
    sender: &UserProfile,
    text: &str,
) -> ChatResult<Message> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::invalid("message text must not be empty"));
    }

    let message = Message::user(sender, text);
    store
        .set(GLOBAL_CHAT, &message.id, serde_json::to_value(&message)?)
        .await?;
    Ok(message)
}

/// The most recent global messages, newest first.
pub async fn recent_global(store: &DocumentStore, limit: Option<i64>) -> ChatResult<Vec<Message>> {
    let limit = limit.unwrap_or(GLOBAL_DEFAULT_LIMIT).clamp(1, 200);
    let docs = store
        .list(GLOBAL_CHAT, "createdAt", Order::Desc, Some(limit))
        .await?;
    docs.iter().map(|d| d.to::<Message>()).collect()
}
