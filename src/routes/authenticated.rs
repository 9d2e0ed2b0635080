use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` route layer, and every handler
/// also takes `AuthUser` explicitly. The caller's id from that extractor drives the
/// Owner-Only checks in `update_post`, `delete_post` and `delete_comment`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /posts
        .route("/posts", post(handlers::create_post))
        // PUT/DELETE /posts/{id}
        // Strict ownership check is enforced within the handler, after the existence check.
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // POST /posts/{post_id}/comments
        .route("/posts/{post_id}/comments", post(handlers::create_comment))
        // DELETE /posts/{post_id}/comments/{comment_id}
        // The comment must belong to the post named in the path.
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            delete(handlers::delete_comment),
        )
}
