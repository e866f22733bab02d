//! Group-conversation handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::{self, ConversationKind, Group, Message};
use crate::directory::{self, UserProfile};
use crate::error::{ChatError, ChatResult};
use crate::groups::{self, GroupUpdate};
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_pic: String,
    #[serde(default)]
    pub admin_only_invites: bool,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    /// Username of the user to add.
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub text: String,
}

/// A group with its document id attached.
#[derive(Debug, Serialize)]
pub struct GroupEnvelope {
    pub id: String,
    #[serde(flatten)]
    pub group: Group,
}

async fn member_group(state: &AppState, group_id: &str, uid: &str) -> ChatResult<Group> {
    let group = groups::load_group(&state.store, group_id).await?;
    if !group.is_member(uid) {
        return Err(ChatError::forbidden("not a member of this group"));
    }
    Ok(group)
}

async fn acting_profile(state: &AppState, uid: &str) -> ChatResult<UserProfile> {
    directory::lookup_by_id(&state.store, uid).await
}

/// POST /api/groups
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateGroupRequest>,
) -> ChatResult<Json<GroupEnvelope>> {
    let creator = acting_profile(&state, &auth.uid).await?;
    let id = groups::create_group(
        &state.store,
        &creator,
        &request.name,
        &request.description,
        &request.profile_pic,
        request.admin_only_invites,
    )
    .await?;
    let group = groups::load_group(&state.store, &id).await?;
    Ok(Json(GroupEnvelope { id, group }))
}

/// GET /api/groups
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> ChatResult<Json<Vec<GroupEnvelope>>> {
    let groups = groups::groups_for_user(&state.store, &auth.uid).await?;
    Ok(Json(
        groups
            .into_iter()
            .map(|(id, group)| GroupEnvelope { id, group })
            .collect(),
    ))
}

/// GET /api/groups/{group_id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> ChatResult<Json<GroupEnvelope>> {
    let group = member_group(&state, &group_id, &auth.uid).await?;
    Ok(Json(GroupEnvelope { id: group_id, group }))
}

/// PATCH /api/groups/{group_id}
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(update): Json<GroupUpdate>,
) -> ChatResult<Json<GroupEnvelope>> {
    let group = groups::update_group_profile(&state.store, &group_id, &auth.uid, update).await?;
    Ok(Json(GroupEnvelope { id: group_id, group }))
}

/// GET /api/groups/{group_id}/messages
pub async fn messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> ChatResult<Json<Vec<Message>>> {
    member_group(&state, &group_id, &auth.uid).await?;
    let messages = chat::list_messages(&state.store, ConversationKind::Group, &group_id).await?;
    Ok(Json(messages))
}

/// POST /api/groups/{group_id}/messages
pub async fn send(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ChatResult<Json<Message>> {
    let sender = acting_profile(&state, &auth.uid).await?;
    let message = chat::send_message(
        &state.store,
        ConversationKind::Group,
        &group_id,
        &sender,
        &request.text,
        request.reply_to.as_deref(),
    )
    .await?;
    Ok(Json(message))
}

/// POST /api/groups/{group_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> ChatResult<Json<serde_json::Value>> {
    member_group(&state, &group_id, &auth.uid).await?;
    chat::mark_read(&state.store, ConversationKind::Group, &group_id, &auth.uid).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// PATCH /api/groups/{group_id}/messages/{message_id}
pub async fn edit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((group_id, message_id)): Path<(String, String)>,
    Json(request): Json<EditMessageRequest>,
) -> ChatResult<Json<Message>> {
    let message = chat::edit_message(
        &state.store,
        ConversationKind::Group,
        &group_id,
        &auth.uid,
        &message_id,
        &request.text,
    )
    .await?;
    Ok(Json(message))
}

/// DELETE /api/groups/{group_id}/messages/{message_id}
pub async fn delete_msg(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((group_id, message_id)): Path<(String, String)>,
) -> ChatResult<Json<serde_json::Value>> {
    chat::delete_message(
        &state.store,
        ConversationKind::Group,
        &group_id,
        &auth.uid,
        &message_id,
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/groups/{group_id}/members
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
    Json(request): Json<MemberRequest>,
) -> ChatResult<Json<UserProfile>> {
    let actor = acting_profile(&state, &auth.uid).await?;
    let added = groups::add_member(&state.store, &group_id, &actor, &request.username).await?;
    Ok(Json(added))
}

/// DELETE /api/groups/{group_id}/members/{uid}
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((group_id, uid)): Path<(String, String)>,
) -> ChatResult<Json<serde_json::Value>> {
    let actor = acting_profile(&state, &auth.uid).await?;
    groups::remove_member(&state.store, &group_id, &actor, &uid).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/groups/{group_id}/admins/{uid}
pub async fn promote_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((group_id, uid)): Path<(String, String)>,
) -> ChatResult<Json<serde_json::Value>> {
    let actor = acting_profile(&state, &auth.uid).await?;
    groups::promote_admin(&state.store, &group_id, &actor, &uid).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// DELETE /api/groups/{group_id}/admins/{uid}
pub async fn demote_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((group_id, uid)): Path<(String, String)>,
) -> ChatResult<Json<serde_json::Value>> {
    let actor = acting_profile(&state, &auth.uid).await?;
    groups::demote_admin(&state.store, &group_id, &actor, &uid).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /api/groups/{group_id}/leave
pub async fn leave(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> ChatResult<Json<serde_json::Value>> {
    let actor = acting_profile(&state, &auth.uid).await?;
    groups::leave_group(&state.store, &group_id, &actor).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
