//! Authentication middleware.
//!
//! Extracts and verifies the bearer token from the `Authorization` header
//! and attaches the resulting [`AuthenticatedUser`] to request extensions
//! for handlers to pick up. Returns 401 when the token is missing or
//! invalid.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::server::state::AppState;

/// Authenticated caller data extracted from the session token.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!("missing Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!("malformed Authorization header");
        StatusCode::UNAUTHORIZED
    })?;

    let session = state.identity.session_from_token(token).map_err(|e| {
        tracing::debug!("rejected session token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        uid: session.account_id,
        email: session.email,
    });

    Ok(next.run(request).await)
}
