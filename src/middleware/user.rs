use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// HTTP header carrying the caller's user ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// User assumed when a request carries no user header
pub const DEFAULT_USER: &str = "default_user";

/// The user a request acts on behalf of
///
/// Authentication happens upstream; this only reads the identity it forwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_USER);

        Ok(UserId(user.to_string()))
    }
}
