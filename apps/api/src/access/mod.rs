//! Access gate: pre-shared API key authentication and per-address throttling.
//!
//! Clients send `X-API-Key: <key>`; `Authorization: Bearer <key>` is accepted
//! as an alias. Authentication runs before rate-limit bookkeeping so rejected
//! callers never consume a bucket.

pub mod rate_limit;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Returns the key the caller presented, if any.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }

    let raw = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())?;
    if raw.len() < 7
        || !raw[..6].eq_ignore_ascii_case("bearer")
        || !raw[6..].starts_with([' ', '\t'])
    {
        return None;
    }
    Some(raw[6..].trim())
}

/// Byte comparison whose running time does not depend on where the first
/// mismatch is.
fn keys_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks the request against the configured service key. An unconfigured
/// key rejects every request.
pub fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), AppError> {
    let expected = expected.ok_or(AppError::Unauthorized)?;
    match presented_key(headers) {
        Some(key) if !key.is_empty() && keys_match(key, expected) => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

/// Middleware guarding content-bearing routes.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(err) = authorize(request.headers(), state.config.service_api_key.as_deref()) {
        debug!(path = %request.uri().path(), "rejected request without a valid API key");
        return Err(err);
    }
    Ok(next.run(request).await)
}
