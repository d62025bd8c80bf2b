//! Token gate
//!
//! Requests must carry the configured shared token; anything else is
//! refused before a handler runs.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::warn;
use subtle::ConstantTimeEq;

use crate::server::AppState;

pub const TOKEN_HEADER: &str = "x-internal-token";

/// Compare a presented token against the expected one in constant time
pub fn token_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(provided) => provided.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}

pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if !token_matches(provided, &state.internal_token) {
        warn!(
            "Rejected {} {}: missing or invalid token",
            request.method(),
            request.uri().path()
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}
