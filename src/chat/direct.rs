//! Direct (two-participant) conversations.

use chrono::Utc;

use crate::chat::types::DirectChat;
use crate::error::{ChatError, ChatResult};
use crate::store::{DocumentStore, Order};

const CHATS: &str = "chats";

/// Canonical lookup key for an unordered participant pair: the two ids
/// sorted and joined with `:`. Both orders of the pair derive the same key.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

/// Find the direct conversation between two users, creating it if none
/// exists. Idempotent: the same pair, in either order, always resolves to
/// the same conversation id.
///
/// A new conversation starts with a null last-message snapshot.
pub async fn find_or_create_direct(
    store: &DocumentStore,
    user_a: &str,
    user_b: &str,
) -> ChatResult<String> {
    if user_a == user_b {
        return Err(ChatError::invalid(
            "a direct conversation needs two distinct users",
        ));
    }

    let key = pair_key(user_a, user_b);
    let existing = store.query_eq(CHATS, "pairKey", &key).await?;
    if let Some(chat) = existing.into_iter().next() {
        return Ok(chat.id);
    }

    let now = Utc::now();
    let chat = DirectChat {
        participants: vec![user_a.to_string(), user_b.to_string()],
        pair_key: key,
        created_at: now,
        last_message_at: now,
        last_message: None,
    };
    let id = store.create(CHATS, serde_json::to_value(&chat)?).await?;

    tracing::info!("created direct chat {} for {}", id, chat.pair_key);
    Ok(id)
}

/// Load a direct conversation record.
pub async fn direct_chat(store: &DocumentStore, chat_id: &str) -> ChatResult<DirectChat> {
    let doc = store
        .get(CHATS, chat_id)
        .await?
        .ok_or_else(|| ChatError::not_found("chat"))?;
    Ok(serde_json::from_value(doc)?)
}

/// All direct conversations a user participates in, most recently active
/// first. This is the chat-list screen's query.
pub async fn chats_for_user(
    store: &DocumentStore,
    uid: &str,
) -> ChatResult<Vec<(String, DirectChat)>> {
    let docs = store
        .query_array_contains(CHATS, "participants", uid, "lastMessageAt", Order::Desc)
        .await?;
    docs.iter()
        .map(|d| Ok((d.id.clone(), d.to::<DirectChat>()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key("a1", "b1"), pair_key("b1", "a1"));
        assert_eq!(pair_key("a1", "b1"), "a1:b1");
    }
}
