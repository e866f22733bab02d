//! Document store adapter.
//!
//! All application data lives in schemaless JSON documents grouped into
//! collections, backed by a single SQLite `documents` table keyed by
//! collection + id and queried through SQLite's JSON1 functions.
//!
//! # Collections
//!
//! Collections are plain path strings. Sub-collections use the parent path:
//!
//! - `users/{uid}`, `usernames/{username}`
//! - `chats/{chatId}`, `chats/{chatId}/messages`
//! - `groups/{groupId}`, `groups/{groupId}/messages`
//! - `groupInvites/{code}`, `globalChat/{messageId}`
//!
//! # Write Semantics
//!
//! Point writes (`set`, `update`, `array_union`, `array_remove`, `delete`)
//! each run in their own transaction. Multi-document sequences that must be
//! all-or-nothing (message + parent snapshot, reservation + profile) go
//! through a [`WriteBatch`], which commits every collected operation in a
//! single transaction.
//!
//! Array operations have set semantics: adding an element that is already
//! present, or removing one that is absent, is a no-op. This keeps
//! membership and reader-set updates safe under concurrent writers.
//!
//! # Subscriptions
//!
//! Every committed write publishes a [`StoreEvent`] on a broadcast channel.
//! Subscribers receive events for as long as they hold the receiver;
//! dropping it releases the subscription.

pub mod documents;
pub mod events;

pub use documents::{Document, DocumentStore, Order, WriteBatch};
pub use events::{StoreEvent, StoreEventKind};
