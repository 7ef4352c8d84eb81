//! Caller identity middleware
//!
//! Authentication happens in the gateway in front of this service, which
//! forwards the caller's id in the `X-User-Id` header.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{constants::USER_ID_HEADER, error::AppError};

/// Caller identity forwarded by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

impl AuthenticatedUser {
    /// Parse the identity header, if present and well-formed
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|id| Self { id })
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Reject requests without a valid caller id
pub async fn auth_middleware(mut request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let Some(user) = AuthenticatedUser::from_headers(request.headers()) else {
        debug!(path = %request.uri().path(), "Auth failed: missing or malformed X-User-Id header");
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
