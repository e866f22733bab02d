/**
 * Router Configuration
 *
 * Combines the public and authenticated route sets into one Axum router.
 *
 * # Route Order
 *
 * 1. Public routes: health, auth entry points, username availability, and
 *    the invite preview (the join page renders before sign-in).
 * 2. Protected routes: everything else, behind the bearer-token
 *    middleware.
 *
 * All routes are JSON-in/JSON-out under `/api`, plus the SSE feed at
 * `/api/events`.
 */
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, chats, global, groups, invites, realtime, upload, users};
use crate::middleware::auth_middleware;
use crate::server::state::AppState;

/// Create the Axum router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/federated", post(auth::federated))
        .route("/api/users/{username}/available", get(users::availability))
        .route("/api/invite/{code}", get(invites::resolve));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/username", post(auth::claim_username))
        .route("/api/users/me", patch(users::update_me))
        .route("/api/users/{username}", get(users::get_by_username))
        .route("/api/chats", post(chats::create).get(chats::list))
        .route("/api/chats/{chat_id}", get(chats::get))
        .route(
            "/api/chats/{chat_id}/messages",
            get(chats::messages).post(chats::send),
        )
        .route("/api/chats/{chat_id}/read", post(chats::mark_read))
        .route(
            "/api/chats/{chat_id}/messages/{message_id}",
            patch(chats::edit).delete(chats::delete),
        )
        .route("/api/groups", post(groups::create).get(groups::list))
        .route(
            "/api/groups/{group_id}",
            get(groups::get).patch(groups::update),
        )
        .route(
            "/api/groups/{group_id}/messages",
            get(groups::messages).post(groups::send),
        )
        .route("/api/groups/{group_id}/read", post(groups::mark_read))
        .route(
            "/api/groups/{group_id}/messages/{message_id}",
            patch(groups::edit).delete(groups::delete_msg),
        )
        .route("/api/groups/{group_id}/members", post(groups::add_member))
        .route(
            "/api/groups/{group_id}/members/{uid}",
            delete(groups::remove_member),
        )
        .route(
            "/api/groups/{group_id}/admins/{uid}",
            post(groups::promote_admin).delete(groups::demote_admin),
        )
        .route("/api/groups/{group_id}/leave", post(groups::leave))
        .route("/api/groups/{group_id}/invite", post(invites::create))
        .route("/api/invite/{code}/join", post(invites::join))
        .route("/api/global", get(global::recent).post(global::send))
        .route("/api/upload", post(upload::image))
        .route("/api/events", get(realtime::events))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        // The web client is served from a different origin in development.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
