//! Caller identity extraction
//!
//! Identity is an opaque `x-user-id` header supplied by the fronting
//! gateway; absence means an anonymous caller. No verification happens
//! here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

const USER_ID_HEADER: &str = "x-user-id";

/// Optional caller identity.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from);

        Ok(Identity(identity))
    }
}
