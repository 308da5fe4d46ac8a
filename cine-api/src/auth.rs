use axum::http::HeaderMap;

use crate::error::ApiError;
use cine_core::UserId;

/// The auth boundary hands the engine an opaque user id via this header.
pub const USER_HEADER: &str = "x-user-id";

pub fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(UserId::new)
        .ok_or_else(|| ApiError::AuthenticationError(format!("Missing {} header", USER_HEADER)))
}
