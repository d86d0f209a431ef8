use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;

use artisan_core::User;

use crate::AppState;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;

/// Paths that ignore the Authorization header entirely, so a stale token
/// never blocks logging in again.
const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/health",
    "/api",
    "/api/",
    "/api/auth/login",
    "/api/auth/register",
];

/// Session owner resolved from a bearer token.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Session middleware.
///
/// A request without a bearer token passes through anonymously; handlers that
/// need a user reject it through the `AuthenticatedUser` extractor. A token
/// that does not resolve to a live session is rejected here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = match extract_session_token(&headers) {
        Ok(token) => token,
        Err(AuthError::MissingToken) => return Ok(next.run(request).await),
        Err(e) => return Err(e),
    };

    let user = state
        .sessions()
        .resolve(&token)
        .await
        .map_err(|e| {
            tracing::error!("Session lookup failed: {:#}", e);
            AuthError::SessionLookupFailed
        })?
        .ok_or_else(|| {
            tracing::warn!("Unknown session token presented: {}", mask_token(&token));
            AuthError::InvalidToken
        })?;

    tracing::debug!("Session {} resolved to user {}", mask_token(&token), user.id);
    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, token });

    Ok(next.run(request).await)
}

/// Token from `Authorization: Bearer <token>`.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let Some(value) = headers.get("Authorization") else {
        return Err(AuthError::MissingToken);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}

/// Mask a token for logging (first 6 and last 4 characters).
pub(crate) fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "****".to_string();
    }
    format!("{}...{}", &token[..6], &token[token.len() - 4..])
}

/// Client IP for brute-force tracking; `unknown` when not served over TCP.
pub(crate) fn client_ip(connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl AuthenticatedUser {
    pub fn require_artisan(&self) -> Result<(), AuthError> {
        if self.user.is_artisan() {
            Ok(())
        } else {
            Err(AuthError::NotArtisan)
        }
    }

    pub fn require_owner(&self, owner_id: &str) -> Result<(), AuthError> {
        if self.user.id == owner_id {
            Ok(())
        } else {
            Err(AuthError::NotOwner)
        }
    }

    /// Owner id for new content: the session user, or an explicit id that
    /// must match it.
    pub fn content_owner(&self, requested: Option<&str>) -> Result<String, AuthError> {
        self.require_artisan()?;
        match requested {
            Some(id) if !id.is_empty() => {
                self.require_owner(id)?;
                Ok(id.to_string())
            }
            _ => Ok(self.user.id.clone()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    MalformedHeader,
    InvalidToken,
    Locked,
    NotArtisan,
    NotOwner,
    SessionLookupFailed,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Locked => StatusCode::TOO_MANY_REQUESTS,
            AuthError::NotArtisan | AuthError::NotOwner => StatusCode::FORBIDDEN,
            AuthError::SessionLookupFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Not authenticated"),
            AuthError::MalformedHeader => {
                write!(f, "Malformed Authorization header. Expected 'Bearer <token>'")
            }
            AuthError::InvalidToken => write!(f, "Invalid or expired session token"),
            AuthError::Locked => write!(
                f,
                "Too many failed login attempts. Please try again later."
            ),
            AuthError::NotArtisan => write!(f, "Only artisans can publish content"),
            AuthError::NotOwner => write!(f, "Not allowed to modify another user's content"),
            AuthError::SessionLookupFailed => write!(f, "Session lookup failed"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
