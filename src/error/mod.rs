//! Error types for the ChatX backend.
//!
//! The error module is organized into focused submodules:
//!
//! - **`types`** - The `ChatError` enum and its constructors
//! - **`conversion`** - Conversion into HTTP responses (`IntoResponse`)
//!
//! # Error Taxonomy
//!
//! `ChatError` carries the full application taxonomy:
//!
//! - `NotFound` - missing user, chat, group, message, or invite
//! - `Conflict` - username already reserved
//! - `AlreadyMember` - target is already in a group's member set
//! - `Forbidden` - non-admin attempting an admin-only action, or acting
//!   on a message the caller does not own
//! - `InvalidCredentials` / `EmailInUse` - identity provider failures
//! - `UploadFailed` - the image host rejected an upload
//! - `Invalid` - malformed request input
//! - `Database` / `Serialization` / `Token` / `Unknown` - infrastructure
//!   failures
//!
//! All errors implement `IntoResponse`, so handlers can return
//! `Result<Json<T>, ChatError>` directly. The response body is JSON:
//! `{"error": "...", "status": 404}`.

pub mod conversion;
pub mod types;

pub use types::{ChatError, ChatResult};
