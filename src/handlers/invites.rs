//! Invite link handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::directory;
use crate::error::ChatResult;
use crate::invites;
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateInviteResponse {
    pub code: String,
    /// Full shareable link, built from the configured public origin.
    pub url: String,
}

/// The join-page preview: enough about the group to decide whether to join.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePreview {
    pub group_id: String,
    pub name: String,
    pub description: String,
    pub profile_pic: String,
    pub member_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub group_id: String,
    pub joined: bool,
}

/// POST /api/groups/{group_id}/invite
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(group_id): Path<String>,
) -> ChatResult<Json<CreateInviteResponse>> {
    let code = invites::create_invite(&state.store, &group_id, &auth.uid).await?;
    let url = format!("{}/invite/{}", state.public_origin, code);
    Ok(Json(CreateInviteResponse { code, url }))
}

/// GET /api/invite/{code}
///
/// Public: the join page shows the preview before the visitor signs in.
pub async fn resolve(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ChatResult<Json<InvitePreview>> {
    let resolved = invites::resolve_invite(&state.store, &code).await?;
    Ok(Json(InvitePreview {
        group_id: resolved.invite.group_id,
        name: resolved.group.name,
        description: resolved.group.description,
        profile_pic: resolved.group.profile_pic,
        member_count: resolved.group.members.len(),
    }))
}

/// POST /api/invite/{code}/join
pub async fn join(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(code): Path<String>,
) -> ChatResult<Json<JoinResponse>> {
    let user = directory::lookup_by_id(&state.store, &auth.uid).await?;
    let resolved = invites::resolve_invite(&state.store, &code).await?;
    let joined = invites::join_via_invite(&state.store, &code, &user).await?;
    Ok(Json(JoinResponse {
        group_id: resolved.invite.group_id,
        joined,
    }))
}
