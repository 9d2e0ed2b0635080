use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, token::TokenState};

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Protected handlers take it
/// as an explicit argument; nothing downstream reads identity from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// parse_bearer
///
/// `Authorization` value -> raw token. The value must split on single spaces into
/// exactly two parts, the first being `Bearer`.
pub fn parse_bearer(value: &str) -> Result<&str, ApiError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(ApiError::Unauthorized("Invalid authorization format")),
    }
}

/// AuthUser Extractor Implementation
///
/// Walks the gate: header present -> `Bearer <token>` format -> Token Service
/// validation. Any failure rejects with 401 and a JSON `error` body.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the Token Service from the app state.
    TokenState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::Unauthorized("Authorization header required"))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid authorization format"))?;

        let token = parse_bearer(header_value)?;

        match tokens.validate(token) {
            Ok(id) => Ok(AuthUser { id }),
            Err(reason) => {
                tracing::debug!(%reason, "bearer token rejected");
                Err(ApiError::Unauthorized("Invalid or expired token"))
            }
        }
    }
}

/// auth_middleware
///
/// Route layer for the protected router. Extracting `AuthUser` runs the whole gate;
/// if it rejects, the handler never executes.
pub async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}
