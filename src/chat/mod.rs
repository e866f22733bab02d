//! Conversation model.
//!
//! Direct chats, the global room, and the message machinery shared with
//! group conversations. A conversation is a parent document (`chats/{id}`
//! or `groups/{id}`) caching a denormalized last-message snapshot, plus an
//! append-only message sub-collection ordered by creation time.
//!
//! Appending a message and refreshing the parent snapshot commit together
//! through one [`crate::store::WriteBatch`], so readers never observe a
//! preview that lags the message list.

pub mod direct;
pub mod global;
pub mod messages;
pub mod types;

pub use direct::{chats_for_user, direct_chat, find_or_create_direct, pair_key};
pub use global::{recent_global, send_global};
pub use messages::{
    delete_message, edit_message, list_messages, mark_read, send_message, system_message,
    ConversationKind,
};
pub use types::{DirectChat, Group, Message, SYSTEM_SENDER, SYSTEM_SENDER_NAME};
