//! Resource Handlers.
//!
//! Every handler checks its preconditions in a fixed order (decode, validate,
//! authorize, load, ownership, mutate) and returns on the first failure. Writes
//! run inside one `UnitOfWork`; any `?` before `commit()` drops it and rolls back.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts},
};

use crate::{error::ApiError, models::HealthResponse};

pub mod auth;
pub mod comments;
pub mod posts;

pub use auth::{login, register};
pub use comments::{create_comment, delete_comment, get_comments};
pub use posts::{create_post, delete_post, get_post, get_posts, update_post};

/// JSON body extractor whose rejection is an [`ApiError`] (400 "Invalid request body").
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejection is an [`ApiError`] (400 "Invalid ID in path").
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// health
///
/// [Public Route] Liveness check for load balancers and monitoring.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
