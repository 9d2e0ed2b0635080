use axum::{Json, extract::State, http::StatusCode};

use super::{AppJson, AppPath};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ResultExt},
    models::{Comment, CommentRequest, ErrorResponse, MessageResponse},
    validation,
};

/// create_comment
///
/// [Authenticated Route] Comments on a live post.
///
/// The parent post is read with a share lock, so it cannot be deleted between the
/// existence check and the insert.
#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = CommentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(post_id): AppPath<i64>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let user_id = auth_user.id;
    validation::comment_fields(&payload.content)?;

    let mut tx = state.repo.begin().await.or_internal("Failed to create comment")?;
    tx.find_post_for_share(post_id)
        .await
        .or_internal("Failed to create comment")?
        .ok_or(ApiError::NotFound("Post not found"))?;

    let record = tx
        .insert_comment(post_id, user_id, &payload.content)
        .await
        .or_internal("Failed to create comment")?;
    let comment = tx
        .load_comment_with_owner(record.id)
        .await
        .or_internal("Failed to load comment data")?
        .ok_or_else(|| {
            ApiError::internal("Failed to load comment data", "comment missing after insert")
        })?;
    tx.commit().await.or_internal("Failed to create comment")?;

    tracing::info!(comment_id = comment.id, post_id, user_id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// get_comments
///
/// [Public Route] All live comments of a live post, owners attached.
#[utoipa::path(
    get,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
pub async fn get_comments(
    State(state): State<AppState>,
    AppPath(post_id): AppPath<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if !state
        .repo
        .post_exists(post_id)
        .await
        .or_internal("Failed to fetch comments")?
    {
        return Err(ApiError::NotFound("Post not found"));
    }

    let comments = state
        .repo
        .list_comments(post_id)
        .await
        .or_internal("Failed to fetch comments")?;
    Ok(Json(comments))
}

/// delete_comment
///
/// [Authenticated Route] Soft-deletes the caller's own comment.
///
/// The comment is looked up by both its id and the post id from the path, so a
/// comment id cannot be used to delete through a different post.
#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}/comments/{comment_id}",
    params(
        ("post_id" = i64, Path, description = "Post ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath((post_id, comment_id)): AppPath<(i64, i64)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = auth_user.id;
    let mut tx = state.repo.begin().await.or_internal("Failed to delete comment")?;
    let existing = tx
        .find_comment_for_update(post_id, comment_id)
        .await
        .or_internal("Failed to delete comment")?
        .ok_or(ApiError::NotFound("Comment not found"))?;

    if existing.user_id != user_id {
        tracing::warn!(comment_id, user_id, owner_id = existing.user_id, "delete rejected: not owner");
        return Err(ApiError::Forbidden("You can only delete your own comments"));
    }

    tx.soft_delete_comment(comment_id)
        .await
        .or_internal("Failed to delete comment")?;
    tx.commit().await.or_internal("Failed to delete comment")?;

    tracing::info!(comment_id, post_id, user_id, "comment deleted");
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
