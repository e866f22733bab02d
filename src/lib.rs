//! ChatX - Main Library
//!
//! ChatX is a web messaging backend built with Rust: direct conversations,
//! group chats with invite links and admin roles, and a global room, all on
//! top of a document-shaped SQLite store with live change events.
//!
//! # Module Structure
//!
//! - **`store`** - Document store adapter: JSON documents in collections,
//!   equality and array-membership queries, atomic write batches, and a
//!   broadcast channel of change events
//! - **`identity`** - Email/password and federated accounts with JWT
//!   session tokens
//! - **`directory`** - User profiles and the unique username registry
//! - **`chat`** - Direct conversations, the global room, and the message
//!   machinery shared with groups
//! - **`groups`** - Group lifecycle, membership, and admin roles
//! - **`invites`** - Single-live-token invite links for groups
//! - **`upload`** - Image-host proxy for profile and group pictures
//! - **`realtime`** - Store events as server-sent-event streams
//! - **`handlers`** / **`routes`** / **`middleware`** / **`server`** - The
//!   Axum HTTP surface

pub mod chat;
pub mod config;
pub mod directory;
pub mod error;
pub mod groups;
pub mod handlers;
pub mod identity;
pub mod invites;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod store;
pub mod upload;

pub use config::Config;
pub use error::{ChatError, ChatResult};
pub use server::{create_app, AppState};
