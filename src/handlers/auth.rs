use axum::{Json, extract::State, http::StatusCode};

use super::AppJson;
use crate::{
    AppState,
    error::{ApiError, ResultExt},
    models::{AuthResponse, ErrorResponse, LoginRequest, NewUser, RegisterRequest},
    password,
    repository::RepoError,
    validation::{self, check, is_valid_email, is_valid_length, is_valid_password},
};

/// register
///
/// [Public Route] Creates an account and returns a token for it.
///
/// *Flow*: validate all three fields, hash the password off the async executor,
/// then insert the user and sign its token inside one transaction. A duplicate
/// email hits the datastore's unique index and surfaces as a plain
/// "Email already exists" with no further detail.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validation::required(&[
        ("email", &payload.email),
        ("password", &payload.password),
        ("name", &payload.name),
    ])?;
    check(is_valid_email(&payload.email), "Invalid email format")?;
    check(
        is_valid_password(&payload.password),
        "Password must be at least 6 characters",
    )?;
    check(
        is_valid_length(&payload.name, 1, 100),
        "Name must be between 1 and 100 characters",
    )?;

    let password_hash = password::hash_password_blocking(payload.password)
        .await
        .or_internal("Failed to hash password")?;

    let mut tx = state.repo.begin().await.or_internal("Failed to create user")?;
    let record = tx
        .create_user(NewUser {
            email: payload.email,
            password_hash,
            name: payload.name,
        })
        .await
        .map_err(|e| match e {
            RepoError::UniqueViolation => ApiError::Conflict("Email already exists"),
            other => ApiError::internal("Failed to create user", other),
        })?;
    let token = state
        .tokens
        .issue(record.id)
        .or_internal("Failed to generate token")?;
    tx.commit().await.or_internal("Failed to create user")?;

    tracing::info!(user_id = record.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: record.into(),
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges email + password for a token.
///
/// *Security*: an unknown email and a wrong password produce the same 401 body.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validation::required(&[("email", &payload.email), ("password", &payload.password)])?;

    let Some(record) = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .or_internal("Failed to log in")?
    else {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };

    if !password::verify_password_blocking(record.password_hash.clone(), payload.password).await {
        tracing::info!(user_id = record.id, "login rejected: wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = state
        .tokens
        .issue(record.id)
        .or_internal("Failed to generate token")?;

    Ok(Json(AuthResponse {
        token,
        user: record.into(),
    }))
}
