//! Request authentication
//!
//! Every request must carry `Authorization: Basic <base64 token>` (a bare
//! token without the scheme is tolerated). Requests under the current
//! namespace must also carry a matching `x-api-key` header.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{ApiError, AuthFailure};
use crate::router::{AppState, V2_PREFIX};

/// Header carrying the API key on the current namespace
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compare two secrets without leaking where they differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Pull the token out of an `Authorization` header value
fn extract_token(value: &str) -> Result<&str, AuthFailure> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthFailure::MalformedHeader);
    }

    match value.split_once(' ') {
        None => Ok(value),
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("basic") => Ok(token.trim()),
        Some(_) => Err(AuthFailure::MalformedHeader),
    }
}

/// Check `Authorization` against the configured auth token
pub fn check_basic_auth(headers: &HeaderMap, auth_token: &str) -> Result<(), AuthFailure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::MalformedHeader)?
        .to_str()
        .map_err(|_| AuthFailure::MalformedHeader)?;

    let token = extract_token(value)?;
    let decoded = BASE64
        .decode(token)
        .map_err(|_| AuthFailure::InvalidToken)?;

    if constant_time_eq(&decoded, auth_token.as_bytes()) {
        Ok(())
    } else {
        Err(AuthFailure::InvalidToken)
    }
}

/// Check `x-api-key` against the configured API key
pub fn check_api_key(headers: &HeaderMap, api_key: &str) -> Result<(), AuthFailure> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthFailure::InvalidApiKey)?;

    if constant_time_eq(presented.as_bytes(), api_key.as_bytes()) {
        Ok(())
    } else {
        Err(AuthFailure::InvalidApiKey)
    }
}

/// Whether `path` lies under the header-keyed namespace
pub fn is_v2_path(path: &str) -> bool {
    path == V2_PREFIX
        || path
            .strip_prefix(V2_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Middleware gating every request, matched or not
pub async fn authenticate(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config;

    if let Err(failure) = check_basic_auth(req.headers(), &config.auth_token) {
        warn!("🔒 {} {} rejected: {:?}", req.method(), req.uri().path(), failure);
        return ApiError::Unauthorized(failure).into_response();
    }

    if is_v2_path(req.uri().path())
        && let Err(failure) = check_api_key(req.headers(), &config.api_key)
    {
        warn!("🔒 {} {} rejected: {:?}", req.method(), req.uri().path(), failure);
        return ApiError::Unauthorized(failure).into_response();
    }

    next.run(req).await
}
