//! Shared fixtures for the integration test suite.
#![allow(dead_code)]

use chatx::directory::{self, UserProfile};
use chatx::store::DocumentStore;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// An in-memory database with migrations applied.
///
/// A single connection keeps the in-memory database alive and shared
/// between the migration run and the test body.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");
    pool
}

pub async fn test_store() -> DocumentStore {
    DocumentStore::new(test_pool().await)
}

/// Register a profile with a deterministic uid derived from the username.
pub async fn seed_user(store: &DocumentStore, username: &str, name: &str) -> UserProfile {
    directory::reserve_username(
        store,
        username,
        &format!("uid-{username}"),
        name,
        &format!("{username}@example.com"),
        "",
    )
    .await
    .expect("failed to seed user")
}
