//! Group invite links.
//!
//! An invite is a random 10-character token in the `groupInvites`
//! collection pointing at its group. A group advertises at most one live
//! invite: issuing a new code deactivates the previous token in the same
//! commit that writes the new one, so stale links cannot keep admitting
//! members.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chat::messages::{push_message, ConversationKind};
use crate::chat::types::{Group, Message};
use crate::directory::UserProfile;
use crate::error::{ChatError, ChatResult};
use crate::groups::{self, GROUPS};
use crate::store::DocumentStore;

pub const GROUP_INVITES: &str = "groupInvites";

const INVITE_CODE_LEN: usize = 10;

/// A stored invite record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInvite {
    pub group_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// A resolved invite: the invite record plus the group it points at.
#[derive(Debug, Clone)]
pub struct ResolvedInvite {
    pub invite: GroupInvite,
    pub group: Group,
}

/// Generate a random invite code.
pub fn generate_invite_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Issue a new invite code for a group.
///
/// The caller must be allowed to add members (see [`can_add_members`]).
/// The new invite record, the deactivation of the previous code, and the
/// group's current-invite pointer update commit together.
pub async fn create_invite(
    store: &DocumentStore,
    group_id: &str,
    creator_uid: &str,
) -> ChatResult<String> {
    let group = groups::load_group(store, group_id).await?;
    if !member_can_invite(&group, creator_uid) {
        return Err(ChatError::forbidden(
            "not allowed to create invites for this group",
        ));
    }

    let code = generate_invite_code();
    let now = Utc::now();
    let invite = GroupInvite {
        group_id: group_id.to_string(),
        created_by: creator_uid.to_string(),
        created_at: now,
        active: true,
    };

    let mut batch = store.batch();
    if let Some(previous) = &group.invite_code {
        // The pointer may outlive a manually deleted token record.
        if store.get(GROUP_INVITES, previous).await?.is_some() {
            batch = batch.update(GROUP_INVITES, previous, json!({ "active": false }));
        }
    }
    batch
        .set(GROUP_INVITES, &code, serde_json::to_value(&invite)?)
        .update(
            GROUPS,
            group_id,
            json!({ "inviteCode": code, "inviteCreatedAt": now }),
        )
        .commit()
        .await?;

    tracing::info!("invite {} issued for group {}", code, group_id);
    Ok(code)
}

/// Resolve an invite code to its group.
///
/// Missing tokens, deactivated tokens, and tokens whose group has vanished
/// all present as `NotFound`.
pub async fn resolve_invite(store: &DocumentStore, code: &str) -> ChatResult<ResolvedInvite> {
    let doc = store
        .get(GROUP_INVITES, code)
        .await?
        .ok_or_else(|| ChatError::not_found("invite"))?;
    let invite: GroupInvite = serde_json::from_value(doc)?;
    if !invite.active {
        return Err(ChatError::not_found("invite"));
    }

    let group = groups::load_group(store, &invite.group_id)
        .await
        .map_err(|_| ChatError::not_found("invite"))?;

    Ok(ResolvedInvite { invite, group })
}

/// Join a group through an invite link.
///
/// Idempotent: a user who is already a member gets success without any
/// mutation. An actual join adds the member and records a system message
/// in the same commit.
pub async fn join_via_invite(
    store: &DocumentStore,
    code: &str,
    user: &UserProfile,
) -> ChatResult<bool> {
    let resolved = resolve_invite(store, code).await?;
    if resolved.group.is_member(&user.uid) {
        return Ok(true);
    }

    let group_id = &resolved.invite.group_id;
    let notice = Message::system(
        format!("{} joined the group via invite link", user.name),
        &user.uid,
    );
    let batch = store
        .batch()
        .array_union(GROUPS, group_id, "members", json!(user.uid));
    push_message(batch, ConversationKind::Group, group_id, &notice)?
        .commit()
        .await?;

    tracing::info!("{} joined group {} via invite", user.uid, group_id);
    Ok(true)
}

/// Deactivate an invite code.
pub async fn deactivate_invite(store: &DocumentStore, code: &str) -> ChatResult<()> {
    store
        .update(GROUP_INVITES, code, json!({ "active": false }))
        .await
        .map_err(|e| match e {
            ChatError::NotFound(_) => ChatError::not_found("invite"),
            other => other,
        })
}

/// True iff the user may add members to the group: a member, and an admin
/// when the group restricts invites to admins.
pub async fn can_add_members(
    store: &DocumentStore,
    group_id: &str,
    uid: &str,
) -> ChatResult<bool> {
    match groups::load_group(store, group_id).await {
        Ok(group) => Ok(member_can_invite(&group, uid)),
        Err(ChatError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

fn member_can_invite(group: &Group, uid: &str) -> bool {
    group.is_member(uid) && (!group.admin_only_invites || group.is_admin(uid))
}
