//! User directory handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::directory::{self, ProfileUpdate, UserProfile};
use crate::error::ChatResult;
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// GET /api/users/{username}
pub async fn get_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ChatResult<Json<UserProfile>> {
    let profile = directory::lookup_by_username(&state.store, &username).await?;
    Ok(Json(profile))
}

/// GET /api/users/{username}/available
///
/// Public: the signup form polls this while the user types.
pub async fn availability(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ChatResult<Json<AvailabilityResponse>> {
    let available = directory::username_available(&state.store, &username).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(update): Json<ProfileUpdate>,
) -> ChatResult<Json<UserProfile>> {
    let profile = directory::update_profile(&state.store, &auth.uid, update).await?;
    Ok(Json(profile))
}
