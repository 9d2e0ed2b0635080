use axum::{Json, extract::State, http::StatusCode};

use super::{AppJson, AppPath};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ResultExt},
    models::{ErrorResponse, MessageResponse, Post, PostRequest},
    validation,
};

/// get_posts
///
/// [Public Route] Lists every live post with its owner and comments.
#[utoipa::path(
    get,
    path = "/api/posts",
    responses((status = 200, description = "All posts", body = [Post]))
)]
pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repo.list_posts().await.or_internal("Failed to fetch posts")?;
    Ok(Json(posts))
}

/// get_post
///
/// [Public Route] One post with its owner and comments (each comment with its owner).
/// Soft-deleted posts are indistinguishable from missing ones.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Post>, ApiError> {
    state
        .repo
        .get_post(id)
        .await
        .or_internal("Failed to fetch post")?
        .map(Json)
        .ok_or(ApiError::NotFound("Post not found"))
}

/// create_post
///
/// [Authenticated Route] Creates a post owned by the caller.
///
/// *Transaction*: insert, then reload with the owner attached, then commit. A
/// failed reload rolls back the insert.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = PostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let user_id = auth_user.id;
    validation::post_fields(&payload.title, &payload.content)?;

    let mut tx = state.repo.begin().await.or_internal("Failed to create post")?;
    let record = tx
        .insert_post(user_id, &payload.title, &payload.content)
        .await
        .or_internal("Failed to create post")?;
    let post = tx
        .load_post_with_owner(record.id)
        .await
        .or_internal("Failed to load post data")?
        .ok_or_else(|| ApiError::internal("Failed to load post data", "post missing after insert"))?;
    tx.commit().await.or_internal("Failed to create post")?;

    tracing::info!(post_id = post.id, user_id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Replaces title and content of the caller's own post.
///
/// *Authorization*: existence is checked first (404), ownership second (403), and
/// both happen on the locked row before anything is written.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn update_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<Json<Post>, ApiError> {
    let user_id = auth_user.id;
    validation::post_fields(&payload.title, &payload.content)?;

    let mut tx = state.repo.begin().await.or_internal("Failed to update post")?;
    let existing = tx
        .find_post_for_update(id)
        .await
        .or_internal("Failed to update post")?
        .ok_or(ApiError::NotFound("Post not found"))?;

    if existing.user_id != user_id {
        tracing::warn!(post_id = id, user_id, owner_id = existing.user_id, "update rejected: not owner");
        return Err(ApiError::Forbidden("You can only update your own posts"));
    }

    tx.update_post(id, &payload.title, &payload.content)
        .await
        .or_internal("Failed to update post")?;
    let post = tx
        .load_post_with_owner(id)
        .await
        .or_internal("Failed to load post data")?
        .ok_or_else(|| ApiError::internal("Failed to load post data", "post missing after update"))?;
    tx.commit().await.or_internal("Failed to update post")?;

    tracing::info!(post_id = id, user_id, "post updated");
    Ok(Json(post))
}

/// delete_post
///
/// [Authenticated Route] Soft-deletes the caller's own post. Its comments are
/// soft-deleted by the datastore in the same transaction.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = auth_user.id;
    let mut tx = state.repo.begin().await.or_internal("Failed to delete post")?;
    let existing = tx
        .find_post_for_update(id)
        .await
        .or_internal("Failed to delete post")?
        .ok_or(ApiError::NotFound("Post not found"))?;

    if existing.user_id != user_id {
        tracing::warn!(post_id = id, user_id, owner_id = existing.user_id, "delete rejected: not owner");
        return Err(ApiError::Forbidden("You can only delete your own posts"));
    }

    tx.soft_delete_post(id).await.or_internal("Failed to delete post")?;
    tx.commit().await.or_internal("Failed to delete post")?;

    tracing::info!(post_id = id, user_id, "post deleted");
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
