//! Application state shared across handlers.

use crate::identity::Identity;
use crate::store::DocumentStore;
use crate::upload::ImageUploader;

/// Central state container handed to every handler.
///
/// Everything inside is cheap to clone: the store and identity adapter
/// share one connection pool, the uploader shares one HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub identity: Identity,
    pub uploader: ImageUploader,
    /// Public origin used to build invite URLs.
    pub public_origin: String,
}
