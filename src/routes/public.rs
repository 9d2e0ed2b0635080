use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints accessible to any client, logged in or not. Reads here only ever see
/// live rows; soft-deleted posts and comments are filtered at the Repository level.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Same liveness check as the root `/health`, reachable under the API prefix.
        .route("/health", get(handlers::health))
        // POST /register
        // Creates an account and returns a token for it.
        .route("/register", post(handlers::register))
        // POST /login
        .route("/login", post(handlers::login))
        // GET /posts
        // Every live post with its owner and comments.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        .route("/posts/{id}", get(handlers::get_post))
        // GET /posts/{post_id}/comments
        // 404 if the parent post is missing or soft-deleted.
        .route("/posts/{post_id}/comments", get(handlers::get_comments))
}
