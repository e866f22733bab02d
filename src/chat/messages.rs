//! Message operations shared by direct and group conversations.
//!
//! Both conversation kinds keep their messages in a sub-collection under
//! the parent record and cache the latest message on the parent. Appending
//! a message and refreshing that cache commit together in one batch.

use serde_json::json;

use crate::chat::types::Message;
use crate::directory::UserProfile;
use crate::error::{ChatError, ChatResult};
use crate::store::{DocumentStore, Order, WriteBatch};

/// Which parent collection a conversation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Direct,
    Group,
}

impl ConversationKind {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Direct => "chats",
            Self::Group => "groups",
        }
    }

    /// The message sub-collection path for a conversation.
    pub fn messages(&self, conversation_id: &str) -> String {
        format!("{}/{}/messages", self.collection(), conversation_id)
    }

    /// The array field holding the conversation's user ids.
    fn member_field(&self) -> &'static str {
        match self {
            Self::Direct => "participants",
            Self::Group => "members",
        }
    }
}

/// Append a message and refresh the parent's last-message snapshot as part
/// of an existing batch. Used by group membership operations so the
/// membership change and its system notice commit together.
pub(crate) fn push_message<'a>(
    batch: WriteBatch<'a>,
    kind: ConversationKind,
    conversation_id: &str,
    message: &Message,
) -> ChatResult<WriteBatch<'a>> {
    Ok(batch
        .set(
            &kind.messages(conversation_id),
            &message.id,
            serde_json::to_value(message)?,
        )
        .update(
            kind.collection(),
            conversation_id,
            json!({
                "lastMessage": message,
                "lastMessageAt": message.created_at,
            }),
        ))
}

/// Send a user message to a conversation.
///
/// The sender must be a participant/member. The message append and the
/// parent snapshot update commit atomically. Replying to a system message
/// is not allowed.
pub async fn send_message(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
    sender: &UserProfile,
    text: &str,
    reply_to: Option<&str>,
) -> ChatResult<Message> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::invalid("message text must not be empty"));
    }

    let parent = store
        .get_required(kind.collection(), conversation_id)
        .await?;
    let is_member = parent[kind.member_field()]
        .as_array()
        .map(|members| members.iter().any(|m| m == sender.uid.as_str()))
        .unwrap_or(false);
    if !is_member {
        return Err(ChatError::forbidden(
            "only conversation members can send messages",
        ));
    }

    let mut message = Message::user(sender, text);

    if let Some(reply_id) = reply_to {
        let target = store
            .get(&kind.messages(conversation_id), reply_id)
            .await?
            .ok_or_else(|| ChatError::not_found("message"))?;
        let target: Message = serde_json::from_value(target)?;
        if target.is_system() {
            return Err(ChatError::forbidden("system messages cannot be replied to"));
        }
        message.reply_to = Some(target.id);
        message.reply_to_text = Some(target.text);
        message.reply_to_sender_name = Some(target.sender_name);
    }

    let batch = push_message(store.batch(), kind, conversation_id, &message)?;
    batch.commit().await?;

    tracing::debug!(
        "message {} sent to {}/{}",
        message.id,
        kind.collection(),
        conversation_id
    );
    Ok(message)
}

/// Append a platform-authored notice recording a state change.
pub async fn system_message(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
    text: String,
    actor_uid: &str,
) -> ChatResult<Message> {
    let message = Message::system(text, actor_uid);
    push_message(store.batch(), kind, conversation_id, &message)?
        .commit()
        .await?;
    Ok(message)
}

/// All messages in a conversation, strictly by creation time ascending.
pub async fn list_messages(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
) -> ChatResult<Vec<Message>> {
    let docs = store
        .list(&kind.messages(conversation_id), "createdAt", Order::Asc, None)
        .await?;
    docs.iter().map(|d| d.to::<Message>()).collect()
}

/// Mark every message the reader has not yet seen as read by them.
///
/// Adds the reader to each unread message's reader set, and to the
/// parent's cached last-message reader set when the last message is among
/// them. Re-running with the same reader is a no-op.
pub async fn mark_read(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
    reader: &str,
) -> ChatResult<()> {
    let messages = list_messages(store, kind, conversation_id).await?;
    let unread: Vec<&Message> = messages
        .iter()
        .filter(|m| m.sender_id != reader && !m.read_by.iter().any(|r| r == reader))
        .collect();
    if unread.is_empty() {
        return Ok(());
    }

    let collection = kind.messages(conversation_id);
    let mut batch = store.batch();
    for message in &unread {
        batch = batch.array_union(&collection, &message.id, "readBy", json!(reader));
    }

    // Keep the denormalized snapshot consistent when it is one of the
    // messages being marked.
    let parent = store
        .get_required(kind.collection(), conversation_id)
        .await?;
    if let Some(last_id) = parent["lastMessage"]["id"].as_str() {
        if unread.iter().any(|m| m.id == last_id) {
            batch = batch.array_union(
                kind.collection(),
                conversation_id,
                "lastMessage.readBy",
                json!(reader),
            );
        }
    }

    batch.commit().await
}

/// Edit a message's text. Restricted to the original sender; system
/// messages are never editable.
pub async fn edit_message(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
    actor_uid: &str,
    message_id: &str,
    text: &str,
) -> ChatResult<Message> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::invalid("message text must not be empty"));
    }

    let collection = kind.messages(conversation_id);
    let doc = store
        .get(&collection, message_id)
        .await?
        .ok_or_else(|| ChatError::not_found("message"))?;
    let mut message: Message = serde_json::from_value(doc)?;

    if message.is_system() || message.sender_id != actor_uid {
        return Err(ChatError::forbidden(
            "only the original sender can edit a message",
        ));
    }

    let edited_at = chrono::Utc::now();
    store
        .update(
            &collection,
            message_id,
            json!({
                "text": text,
                "edited": true,
                "editedAt": edited_at,
            }),
        )
        .await?;

    message.text = text.to_string();
    message.edited = Some(true);
    message.edited_at = Some(edited_at);
    Ok(message)
}

/// Delete a message outright. Restricted to the original sender. No
/// tombstone; the parent's last-message snapshot is not rewound.
pub async fn delete_message(
    store: &DocumentStore,
    kind: ConversationKind,
    conversation_id: &str,
    actor_uid: &str,
    message_id: &str,
) -> ChatResult<()> {
    let collection = kind.messages(conversation_id);
    let doc = store
        .get(&collection, message_id)
        .await?
        .ok_or_else(|| ChatError::not_found("message"))?;
    let message: Message = serde_json::from_value(doc)?;

    if message.is_system() || message.sender_id != actor_uid {
        return Err(ChatError::forbidden(
            "only the original sender can delete a message",
        ));
    }

    store.delete(&collection, message_id).await
}
