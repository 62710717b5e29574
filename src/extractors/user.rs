//! Extract the authenticated caller from headers set by the upstream identity provider.

use crate::access::Actor;
use crate::definition::Role;
use crate::error::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The caller's `{id, role}`. Trusted as given; missing or malformed headers are 401.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: i64 = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("invalid {} header", USER_ID_HEADER)))?;
        let role: Role = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("invalid {} header", USER_ROLE_HEADER)))?;
        Ok(AuthUser(Actor::new(id, role)))
    }
}
