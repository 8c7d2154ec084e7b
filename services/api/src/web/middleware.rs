//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::AppState;
use crate::web::token::verify_token;

/// Middleware that validates the session token and extracts the user id.
///
/// The token is read from the `token` cookie or, failing that, from a
/// `Authorization: Bearer` header. If valid, the user id is inserted into
/// request extensions for handlers to use. If invalid or missing, returns
/// 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = token_from_cookie(req.headers())
        .or_else(|| token_from_bearer(req.headers()))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = verify_token(&token, &state.config.jwt_secret)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

fn token_from_cookie(headers: &axum::http::HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("token="))
        .map(str::to_string)
}

fn token_from_bearer(headers: &axum::http::HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header.strip_prefix("Bearer ").map(str::to_string)
}
