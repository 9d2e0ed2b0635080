use std::sync::Arc;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind, get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

/// Lifetime of an issued token: 24 hours.
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// The only algorithm tokens are signed with, and the only one accepted.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims
///
/// Payload embedded in every bearer token. `sub` carries the user id as a string,
/// per RFC 7519; it is parsed back into an integer id on validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// Why a token was refused. All but `Signing` are client errors.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token is signed with an unexpected algorithm")]
    AlgorithmMismatch,
    #[error("token has expired")]
    Expired,
    #[error("token subject is missing or malformed")]
    InvalidSubject,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// TokenService
///
/// Issues and validates HS256 bearer tokens. Keys are derived once from the
/// configured secret; the service is shared read-only across requests.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Shared handle stored in the application state.
pub type TokenState = Arc<TokenService>;

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_secret(config.jwt_secret.as_bytes())
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        // Validation::new pins the accepted algorithm list to exactly one entry;
        // a header naming anything else fails with InvalidAlgorithm.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        // No grace period: `exp` in the past is expired.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `user_id`, expiring [`TOKEN_TTL_SECS`] from now.
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature, algorithm and expiry, then extracts the user id.
    pub fn validate(&self, token: &str) -> Result<i64, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::AlgorithmMismatch
                }
                ErrorKind::MissingRequiredClaim(_) | ErrorKind::InvalidSubject => {
                    TokenError::InvalidSubject
                }
                _ => TokenError::Malformed,
            }
        })?;

        match data.claims.sub.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(TokenError::InvalidSubject),
        }
    }
}
