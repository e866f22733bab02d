//! User directory integration tests.

mod common;

use chatx::directory::{self, ProfileUpdate};
use chatx::error::ChatError;
use common::{seed_user, test_store};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_username_reservation_is_case_insensitive() {
    let store = test_store().await;
    seed_user(&store, "alice", "Alice").await;

    // The same name in different case is the same reservation.
    let err = directory::reserve_username(&store, "Alice", "uid-other", "Other", "o@example.com", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Conflict(_)));

    assert!(!directory::username_available(&store, "ALICE").await.unwrap());
    assert!(directory::username_available(&store, "alice2").await.unwrap());
}

#[tokio::test]
async fn test_username_validation() {
    let store = test_store().await;

    let err = directory::reserve_username(&store, "ab", "uid-ab", "Ab", "ab@example.com", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Invalid(_)));

    // Invalid candidates report unavailable rather than erroring.
    assert!(!directory::username_available(&store, "ab").await.unwrap());
    assert!(!directory::username_available(&store, "!!").await.unwrap());
}

#[tokio::test]
async fn test_lookup_by_username_and_id() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;

    let by_username = directory::lookup_by_username(&store, "Alice").await.unwrap();
    assert_eq!(by_username.uid, alice.uid);
    assert_eq!(by_username.email, "alice@example.com");

    let by_id = directory::lookup_by_id(&store, &alice.uid).await.unwrap();
    assert_eq!(by_id.username, "alice");

    let err = directory::lookup_by_username(&store, "nobody").await.unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_update_profile_touches_only_given_fields() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;

    let updated = directory::update_profile(
        &store,
        &alice.uid,
        ProfileUpdate {
            bio: Some("hello there".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.bio, "hello there");
    assert_eq!(updated.name, "Alice", "untouched fields survive");
    assert_eq!(updated.username, "alice");
}
