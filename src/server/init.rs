//! Application startup: pool, migrations, state, router.

use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;

use crate::config::Config;
use crate::error::{ChatError, ChatResult};
use crate::identity::Identity;
use crate::routes::create_router;
use crate::server::state::AppState;
use crate::store::DocumentStore;
use crate::upload::ImageUploader;

/// Connect to the database, run migrations, and build the router.
pub async fn create_app(config: &Config) -> ChatResult<Router> {
    tracing::info!("connecting to {}", config.database_url);
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;

    tracing::info!("running database migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| ChatError::Unknown(format!("migration failed: {e}")))?;

    let state = AppState {
        store: DocumentStore::new(pool.clone()),
        identity: Identity::new(pool),
        uploader: ImageUploader::new(&config.image_host_endpoint, &config.image_host_api_key),
        public_origin: config.public_origin.clone(),
    };

    Ok(create_router(state))
}
