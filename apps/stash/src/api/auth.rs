//! # Authentication Module
//!
//! API key authentication for the Stash HTTP API.
//!
//! The key comes from `security.api_key` (or `STASH_API_KEY`). When set, every
//! request except `/health` must carry it:
//!
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The configured API key, shared with the middleware as router state.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// Constant-time comparison against a presented key.
    ///
    /// Both sides are padded to the same length so the comparison always
    /// runs over the same number of bytes.
    pub fn matches(&self, provided: &str) -> bool {
        let provided = provided.as_bytes();
        let expected = self.0.as_bytes();

        let max_len = provided.len().max(expected.len());
        let mut padded_provided = vec![0u8; max_len];
        let mut padded_expected = vec![0u8; max_len];
        padded_provided[..provided.len()].copy_from_slice(provided);
        padded_expected[..expected.len()].copy_from_slice(expected);

        let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
        bytes_match && provided.len() == expected.len()
    }
}

// Never print the key itself.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// API key authentication middleware.
///
/// `/health` is always allowed (for load balancer checks). Everything else
/// requires `Authorization: Bearer <key>`; a raw `<key>` is accepted too.
pub async fn api_key_auth_middleware(
    State(expected): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
            if expected.matches(provided) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Authentication failed: invalid API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
