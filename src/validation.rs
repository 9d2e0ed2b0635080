//! Input Validator: pure field checks shared by the resource handlers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Returns the name of the first field (in slice order) whose value is empty.
pub fn require_non_empty<'a>(fields: &[(&'a str, &str)]) -> Result<(), &'a str> {
    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((name, _)) => Err(*name),
        None => Ok(()),
    }
}

/// `local@domain.tld`: local allows letters, digits and `._%+-`, domain allows
/// letters, digits and `.-`, the tld is two or more letters.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Inclusive bounds on the number of characters (not bytes).
pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
    let length = value.chars().count();
    (min..=max).contains(&length)
}

pub fn is_valid_password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LENGTH
}

// --- Handler-facing rule helpers ---
// Each returns the first violated rule as an ApiError::Validation.

pub(crate) fn required(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    require_non_empty(fields).map_err(|field| ApiError::Validation(format!("{field} is required")))
}

pub(crate) fn check(ok: bool, message: &str) -> Result<(), ApiError> {
    if ok {
        Ok(())
    } else {
        Err(ApiError::Validation(message.to_string()))
    }
}

pub(crate) fn post_fields(title: &str, content: &str) -> Result<(), ApiError> {
    required(&[("title", title), ("content", content)])?;
    check(
        is_valid_length(title, 3, 200),
        "Title must be between 3 and 200 characters",
    )?;
    check(
        is_valid_length(content, 10, 10_000),
        "Content must be between 10 and 10000 characters",
    )
}

pub(crate) fn comment_fields(content: &str) -> Result<(), ApiError> {
    required(&[("content", content)])?;
    check(
        is_valid_length(content, 1, 1_000),
        "Content must be between 1 and 1000 characters",
    )
}
