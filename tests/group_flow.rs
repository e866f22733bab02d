//! Group lifecycle integration tests.

mod common;

use chatx::chat::{self, ConversationKind, SYSTEM_SENDER};
use chatx::error::ChatError;
use chatx::groups::{self, GroupUpdate};
use common::{seed_user, test_store};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_create_group_seeds_creator_and_notice() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;

    let group_id = groups::create_group(&store, &alice, "Team", "our team", "", false)
        .await
        .unwrap();
    let group = groups::load_group(&store, &group_id).await.unwrap();

    assert_eq!(group.members, vec![alice.uid.clone()]);
    assert_eq!(group.admins, vec![alice.uid.clone()]);
    assert_eq!(group.created_by, alice.uid);

    let messages = chat::list_messages(&store, ConversationKind::Group, &group_id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, SYSTEM_SENDER);
    assert_eq!(messages[0].text, "Alice created the group");
    // The acting user has already seen the notice they caused.
    assert_eq!(messages[0].read_by, vec![alice.uid.clone()]);

    // The notice is also the cached last message.
    let last = group.last_message.expect("snapshot should be populated");
    assert_eq!(last.id, messages[0].id);
}

#[tokio::test]
async fn test_create_group_rejects_blank_name() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;

    let err = groups::create_group(&store, &alice, "   ", "", "", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Invalid(_)));
}

#[tokio::test]
async fn test_add_member_emits_notice_and_rejects_duplicates() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let group_id = groups::create_group(&store, &alice, "Team", "", "", false)
        .await
        .unwrap();

    let added = groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();
    assert_eq!(added.uid, bob.uid);

    let group = groups::load_group(&store, &group_id).await.unwrap();
    assert!(group.is_member(&bob.uid));
    assert!(!group.is_admin(&bob.uid));

    let messages = chat::list_messages(&store, ConversationKind::Group, &group_id)
        .await
        .unwrap();
    assert_eq!(messages.last().unwrap().text, "Alice added Bob to the group");

    let err = groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::AlreadyMember));

    let err = groups::add_member(&store, &group_id, &alice, "nosuchuser")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_admin_only_invites_restrict_adding() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let carol = seed_user(&store, "carol", "Carol").await;
    let group_id = groups::create_group(&store, &alice, "Locked", "", "", true)
        .await
        .unwrap();

    groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();

    // Bob is a member but not an admin, and invites are admin-only.
    let err = groups::add_member(&store, &group_id, &bob, "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));

    groups::promote_admin(&store, &group_id, &alice, &bob.uid)
        .await
        .unwrap();
    let added = groups::add_member(&store, &group_id, &bob, "carol")
        .await
        .unwrap();
    assert_eq!(added.uid, carol.uid);
}

#[tokio::test]
async fn test_admin_role_management() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let group_id = groups::create_group(&store, &alice, "Team", "", "", false)
        .await
        .unwrap();
    groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();

    // Non-admins cannot manage roles or members.
    let err = groups::promote_admin(&store, &group_id, &bob, &alice.uid)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));
    let err = groups::remove_member(&store, &group_id, &bob, &alice.uid)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));

    groups::promote_admin(&store, &group_id, &alice, &bob.uid)
        .await
        .unwrap();
    let group = groups::load_group(&store, &group_id).await.unwrap();
    assert!(group.is_admin(&bob.uid));

    groups::demote_admin(&store, &group_id, &alice, &bob.uid)
        .await
        .unwrap();
    let group = groups::load_group(&store, &group_id).await.unwrap();
    assert!(!group.is_admin(&bob.uid));
    assert!(group.is_member(&bob.uid), "demotion keeps membership");

    let messages = chat::list_messages(&store, ConversationKind::Group, &group_id)
        .await
        .unwrap();
    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert!(texts.contains(&"Alice made Bob an admin"));
    assert!(texts.contains(&"Alice removed Bob as an admin"));
}

#[tokio::test]
async fn test_remove_member_drops_admin_role_too() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let group_id = groups::create_group(&store, &alice, "Team", "", "", false)
        .await
        .unwrap();
    groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();
    groups::promote_admin(&store, &group_id, &alice, &bob.uid)
        .await
        .unwrap();

    groups::remove_member(&store, &group_id, &alice, &bob.uid)
        .await
        .unwrap();
    let group = groups::load_group(&store, &group_id).await.unwrap();
    assert!(!group.is_member(&bob.uid));
    assert!(!group.is_admin(&bob.uid), "admins stay a subset of members");
}

#[tokio::test]
async fn test_leave_group_removes_both_roles() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let group_id = groups::create_group(&store, &alice, "Team", "", "", false)
        .await
        .unwrap();
    groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();

    groups::leave_group(&store, &group_id, &alice).await.unwrap();
    let group = groups::load_group(&store, &group_id).await.unwrap();
    assert!(!group.is_member(&alice.uid));
    assert!(!group.is_admin(&alice.uid));
    assert!(group.is_member(&bob.uid));

    let messages = chat::list_messages(&store, ConversationKind::Group, &group_id)
        .await
        .unwrap();
    assert_eq!(messages.last().unwrap().text, "Alice left the group");

    // A non-member cannot leave again.
    let err = groups::leave_group(&store, &group_id, &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));
}

#[tokio::test]
async fn test_update_group_profile_is_admin_only() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;
    let group_id = groups::create_group(&store, &alice, "Team", "old", "", false)
        .await
        .unwrap();
    groups::add_member(&store, &group_id, &alice, "bob")
        .await
        .unwrap();

    let err = groups::update_group_profile(
        &store,
        &group_id,
        &bob.uid,
        GroupUpdate {
            name: Some("Hijacked".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)));

    let updated = groups::update_group_profile(
        &store,
        &group_id,
        &alice.uid,
        GroupUpdate {
            name: Some("Team Two".into()),
            description: Some("new".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Team Two");
    assert_eq!(updated.description, "new");
}

#[tokio::test]
async fn test_groups_for_user_lists_memberships() {
    let store = test_store().await;
    let alice = seed_user(&store, "alice", "Alice").await;
    let bob = seed_user(&store, "bob", "Bob").await;

    let first = groups::create_group(&store, &alice, "First", "", "", false)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = groups::create_group(&store, &alice, "Second", "", "", false)
        .await
        .unwrap();
    groups::create_group(&store, &bob, "Bob's", "", "", false)
        .await
        .unwrap();

    let listed = groups::groups_for_user(&store, &alice.uid).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].0, second, "most recent activity first");
    assert_eq!(listed[1].0, first);
}
