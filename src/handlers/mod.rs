//! HTTP handlers.
//!
//! One module per area of the API surface. Handlers stay thin: decode the
//! request, call into the library modules, encode the response. All error
//! paths flow through `ChatError`'s `IntoResponse`.

pub mod auth;
pub mod chats;
pub mod global;
pub mod groups;
pub mod invites;
pub mod realtime;
pub mod upload;
pub mod users;
