//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Extracts the auth session id from the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie.
///
/// If valid, inserts the session's `SessionGrant` into request extensions for
/// handlers to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_session_id = session_cookie(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let grant = state
        .credentials
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(grant);
    Ok(next.run(req).await)
}
