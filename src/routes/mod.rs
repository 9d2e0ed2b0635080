/// Router Module Index
///
/// Splits the API into two security-segregated routers. Access control is applied
/// per module with Axum layers, so a protected endpoint cannot be registered
/// without the Auth Gate by accident.

/// Routes reachable without a token (health, register, login, reads).
pub mod public;

/// Routes behind the `auth_middleware` route layer.
pub mod authenticated;
