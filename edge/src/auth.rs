//! Bearer-token handling on the edge side: the edge decodes the caller's
//! claims itself (to stamp owner/admin fields into outgoing RPC requests
//! per spec) and forwards the raw token as `authorization` metadata so the
//! downstream service's own interceptor can re-verify it.

use std::time::Duration;

use axum::http::HeaderMap;
use marketplace_platform::auth::{extract_bearer, Claims, TokenVerifier};
use tonic::Request;

use crate::error::ApiError;

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    extract_bearer(header).map_err(|e| ApiError::unauthenticated(e.to_string()))
}

/// Requires a present, valid bearer token; used by every auth-* route.
/// Returns the raw token too, so the handler can forward it downstream
/// alongside the claims it read out of it.
pub fn require_auth<'h>(headers: &'h HeaderMap, verifier: &TokenVerifier) -> Result<(&'h str, Claims), ApiError> {
    let token = bearer_token(headers)?;
    let claims = verifier.verify(token).map_err(|e| ApiError::unauthenticated(e.to_string()))?;
    Ok((token, claims))
}

/// Public routes don't require a token but still forward one if present, so
/// a logged-in caller's identity is available to the downstream service
/// where relevant (e.g. personalized listing search, out of scope here).
pub fn optional_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).ok()
}

/// Attaches the raw bearer token (if any) as `authorization` metadata and a
/// deadline to an outgoing RPC request.
pub fn outgoing<T>(payload: T, token: Option<&str>, deadline_secs: u64) -> Request<T> {
    let mut req = Request::new(payload);
    if let Some(token) = token {
        if let Ok(value) = format!("Bearer {token}").parse() {
            req.metadata_mut().insert("authorization", value);
        }
    }
    req.set_timeout(Duration::from_secs(deadline_secs));
    req
}
