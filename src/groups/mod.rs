//! Group conversations and membership management.
//!
//! Groups live in the `groups` collection with member and admin id sets
//! mutated through element-wise array operations, never full replacement,
//! so concurrent membership edits cannot clobber each other. Every
//! membership change commits together with the system message that records
//! it, naming actor and target by display name resolved at call time.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::chat::messages::{push_message, ConversationKind};
use crate::chat::types::{Group, Message};
use crate::directory::{self, UserProfile};
use crate::error::{ChatError, ChatResult};
use crate::store::{DocumentStore, Order};

pub const GROUPS: &str = "groups";

const KIND: ConversationKind = ConversationKind::Group;

/// Admin-editable group profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub profile_pic: Option<String>,
    pub admin_only_invites: Option<bool>,
}

/// Create a group. The creator becomes the sole initial member and admin,
/// and a system message records the creation.
pub async fn create_group(
    store: &DocumentStore,
    creator: &UserProfile,
    name: &str,
    description: &str,
    profile_pic: &str,
    admin_only_invites: bool,
) -> ChatResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatError::invalid("group name must not be empty"));
    }

    let now = Utc::now();
    let group = Group {
        name: name.to_string(),
        description: description.trim().to_string(),
        profile_pic: profile_pic.to_string(),
        created_by: creator.uid.clone(),
        members: vec![creator.uid.clone()],
        admins: vec![creator.uid.clone()],
        admin_only_invites,
        invite_code: None,
        invite_created_at: None,
        created_at: now,
        last_message_at: now,
        last_message: None,
    };

    let group_id = uuid::Uuid::new_v4().to_string();
    let notice = Message::system(format!("{} created the group", creator.name), &creator.uid);

    let batch = store
        .batch()
        .set(GROUPS, &group_id, serde_json::to_value(&group)?);
    push_message(batch, KIND, &group_id, &notice)?.commit().await?;

    tracing::info!("group {} created by {}", group_id, creator.uid);
    Ok(group_id)
}

/// Load a group record.
pub async fn load_group(store: &DocumentStore, group_id: &str) -> ChatResult<Group> {
    let doc = store
        .get(GROUPS, group_id)
        .await?
        .ok_or_else(|| ChatError::not_found("group"))?;
    Ok(serde_json::from_value(doc)?)
}

/// All groups a user belongs to, most recently active first.
pub async fn groups_for_user(store: &DocumentStore, uid: &str) -> ChatResult<Vec<(String, Group)>> {
    let docs = store
        .query_array_contains(GROUPS, "members", uid, "lastMessageAt", Order::Desc)
        .await?;
    docs.iter()
        .map(|d| Ok((d.id.clone(), d.to::<Group>()?)))
        .collect()
}

/// Add a user to a group by username.
///
/// Any member may add when `admin_only_invites` is off; otherwise only
/// admins. Fails with `NotFound` when the username doesn't resolve and
/// `AlreadyMember` when the target is already in the member set.
pub async fn add_member(
    store: &DocumentStore,
    group_id: &str,
    actor: &UserProfile,
    target_username: &str,
) -> ChatResult<UserProfile> {
    let group = load_group(store, group_id).await?;

    if !group.is_member(&actor.uid) {
        return Err(ChatError::forbidden("only members can add users"));
    }
    if group.admin_only_invites && !group.is_admin(&actor.uid) {
        return Err(ChatError::forbidden(
            "only admins can add members to this group",
        ));
    }

    let target = directory::lookup_by_username(store, target_username).await?;
    if group.is_member(&target.uid) {
        return Err(ChatError::AlreadyMember);
    }

    let notice = Message::system(
        format!("{} added {} to the group", actor.name, target.name),
        &actor.uid,
    );
    let batch = store
        .batch()
        .array_union(GROUPS, group_id, "members", json!(target.uid));
    push_message(batch, KIND, group_id, &notice)?.commit().await?;

    tracing::info!("{} added {} to group {}", actor.uid, target.uid, group_id);
    Ok(target)
}

/// Remove a member from a group. Admin-only. Removes from both the member
/// and admin sets so the subset invariant holds.
pub async fn remove_member(
    store: &DocumentStore,
    group_id: &str,
    actor: &UserProfile,
    target_uid: &str,
) -> ChatResult<()> {
    let group = require_admin(store, group_id, &actor.uid).await?;
    if !group.is_member(target_uid) {
        return Err(ChatError::not_found("member"));
    }

    let target = directory::lookup_by_id(store, target_uid).await?;
    let notice = Message::system(
        format!("{} removed {} from the group", actor.name, target.name),
        &actor.uid,
    );
    let batch = store
        .batch()
        .array_remove(GROUPS, group_id, "members", json!(target_uid))
        .array_remove(GROUPS, group_id, "admins", json!(target_uid));
    push_message(batch, KIND, group_id, &notice)?.commit().await
}

/// Grant admin to a member. Admin-only.
pub async fn promote_admin(
    store: &DocumentStore,
    group_id: &str,
    actor: &UserProfile,
    target_uid: &str,
) -> ChatResult<()> {
    let group = require_admin(store, group_id, &actor.uid).await?;
    if !group.is_member(target_uid) {
        return Err(ChatError::not_found("member"));
    }
    if group.is_admin(target_uid) {
        return Err(ChatError::Conflict("user is already an admin".into()));
    }

    let target = directory::lookup_by_id(store, target_uid).await?;
    let notice = Message::system(
        format!("{} made {} an admin", actor.name, target.name),
        &actor.uid,
    );
    let batch = store
        .batch()
        .array_union(GROUPS, group_id, "admins", json!(target_uid));
    push_message(batch, KIND, group_id, &notice)?.commit().await
}

/// Revoke admin from a member. Admin-only.
pub async fn demote_admin(
    store: &DocumentStore,
    group_id: &str,
    actor: &UserProfile,
    target_uid: &str,
) -> ChatResult<()> {
    let group = require_admin(store, group_id, &actor.uid).await?;
    if !group.is_admin(target_uid) {
        return Err(ChatError::not_found("admin"));
    }

    let target = directory::lookup_by_id(store, target_uid).await?;
    let notice = Message::system(
        format!("{} removed {} as an admin", actor.name, target.name),
        &actor.uid,
    );
    let batch = store
        .batch()
        .array_remove(GROUPS, group_id, "admins", json!(target_uid));
    push_message(batch, KIND, group_id, &notice)?.commit().await
}

/// Leave a group: self-removal from both the member and admin sets, with a
/// system message recording it.
pub async fn leave_group(
    store: &DocumentStore,
    group_id: &str,
    actor: &UserProfile,
) -> ChatResult<()> {
    let group = load_group(store, group_id).await?;
    if !group.is_member(&actor.uid) {
        return Err(ChatError::forbidden("not a member of this group"));
    }

    let notice = Message::system(format!("{} left the group", actor.name), &actor.uid);
    // The notice commits before the removal takes effect, in the same
    // transaction, so the leaver's own message is never rejected.
    let batch = push_message(store.batch(), KIND, group_id, &notice)?
        .array_remove(GROUPS, group_id, "members", json!(actor.uid))
        .array_remove(GROUPS, group_id, "admins", json!(actor.uid));
    batch.commit().await?;

    tracing::info!("{} left group {}", actor.uid, group_id);
    Ok(())
}

/// Update the group's profile fields. Admin-only.
pub async fn update_group_profile(
    store: &DocumentStore,
    group_id: &str,
    actor_uid: &str,
    update: GroupUpdate,
) -> ChatResult<Group> {
    require_admin(store, group_id, actor_uid).await?;

    let mut fields = serde_json::Map::new();
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ChatError::invalid("group name must not be empty"));
        }
        fields.insert("name".to_string(), json!(name));
    }
    if let Some(description) = update.description {
        fields.insert("description".to_string(), json!(description.trim()));
    }
    if let Some(pic) = update.profile_pic {
        fields.insert("profilePic".to_string(), json!(pic));
    }
    if let Some(flag) = update.admin_only_invites {
        fields.insert("adminOnlyInvites".to_string(), json!(flag));
    }

    if !fields.is_empty() {
        store
            .update(GROUPS, group_id, serde_json::Value::Object(fields))
            .await?;
    }

    load_group(store, group_id).await
}

async fn require_admin(
    store: &DocumentStore,
    group_id: &str,
    actor_uid: &str,
) -> ChatResult<Group> {
    let group = load_group(store, group_id).await?;
    if !group.is_admin(actor_uid) {
        return Err(ChatError::forbidden("only admins can do this"));
    }
    Ok(group)
}
