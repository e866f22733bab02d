//! Authentication handlers.
//!
//! Sign-up creates the identity account, then reserves the username and
//! creates the profile in one commit. Federated sign-in may arrive before
//! a profile exists; the response tells the client whether it still has to
//! claim a username via `/api/auth/username`.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::directory::{self, UserProfile};
use crate::error::{ChatError, ChatResult};
use crate::middleware::AuthenticatedUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct FederatedRequest {
    /// Stable subject identifier from the federated provider.
    pub subject: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimUsernameRequest {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedResponse {
    pub token: String,
    pub needs_username: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ChatResult<Json<AuthResponse>> {
    tracing::info!("signup request for {}", request.email);

    let session = state
        .identity
        .sign_up_email(&request.email, &request.password)
        .await?;
    let user = directory::reserve_username(
        &state.store,
        &request.username,
        &session.account_id,
        &request.name,
        &session.email,
        "",
    )
    .await?;

    Ok(Json(AuthResponse {
        token: session.token,
        user,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ChatResult<Json<AuthResponse>> {
    let session = state
        .identity
        .sign_in_email(&request.email, &request.password)
        .await?;
    let user = directory::lookup_by_id(&state.store, &session.account_id).await?;

    Ok(Json(AuthResponse {
        token: session.token,
        user,
    }))
}

/// POST /api/auth/federated
///
/// Trusted callback for a federated sign-in. On first use the profile does
/// not exist yet; when the request carries a username it is claimed right
/// away, otherwise the client is told to come back via
/// `/api/auth/username`.
pub async fn federated(
    State(state): State<AppState>,
    Json(request): Json<FederatedRequest>,
) -> ChatResult<Json<FederatedResponse>> {
    let signin = state
        .identity
        .sign_in_federated(&request.subject, &request.email)
        .await?;
    let session = signin.session;

    match directory::lookup_by_id(&state.store, &session.account_id).await {
        Ok(user) => Ok(Json(FederatedResponse {
            token: session.token,
            needs_username: false,
            user: Some(user),
        })),
        Err(ChatError::NotFound(_)) => {
            let Some(username) = request.username else {
                return Ok(Json(FederatedResponse {
                    token: session.token,
                    needs_username: true,
                    user: None,
                }));
            };
            let name = request.name.unwrap_or_else(|| username.clone());
            let user = directory::reserve_username(
                &state.store,
                &username,
                &session.account_id,
                &name,
                &session.email,
                "",
            )
            .await?;
            Ok(Json(FederatedResponse {
                token: session.token,
                needs_username: false,
                user: Some(user),
            }))
        }
        Err(e) => Err(e),
    }
}

/// POST /api/auth/username
///
/// Completes a federated sign-up by reserving a username for the
/// authenticated account.
pub async fn claim_username(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<ClaimUsernameRequest>,
) -> ChatResult<Json<UserProfile>> {
    if directory::lookup_by_id(&state.store, &auth.uid).await.is_ok() {
        return Err(ChatError::Conflict("profile already exists".into()));
    }

    let name = request.name.unwrap_or_else(|| request.username.clone());
    let user = directory::reserve_username(
        &state.store,
        &request.username,
        &auth.uid,
        &name,
        &auth.email,
        "",
    )
    .await?;
    Ok(Json(user))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> ChatResult<Json<UserProfile>> {
    let user = directory::lookup_by_id(&state.store, &auth.uid).await?;
    Ok(Json(user))
}
