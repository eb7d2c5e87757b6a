// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token checks for the gateway.
//!
//! Two tokens live here: the webhook verify token compared during the
//! channel's subscription handshake, and the internal API token gating the
//! diagnostics send endpoints. A missing bearer header gets 401, a wrong
//! token gets 403. With no internal token configured the diagnostics
//! endpoints stay open, which is the expected shape for local development.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

/// Token configuration shared with the request handlers.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for the diagnostics send endpoints. `None` disables the gate.
    pub internal_token: Option<String>,
    /// Expected `hub.verify_token` for the webhook handshake.
    pub verify_token: Option<String>,
}

// Manual Debug so neither token can leak through error chains or trace output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |slot: &Option<String>| slot.as_ref().map(|_| "[redacted]");
        f.debug_struct("AuthConfig")
            .field("internal_token", &mask(&self.internal_token))
            .field("verify_token", &mask(&self.verify_token))
            .finish()
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let header = request.headers().get(header::AUTHORIZATION)?;
    header.to_str().ok()?.strip_prefix("Bearer ")
}

/// Middleware for the bearer-gated diagnostics routes.
pub async fn require_internal_token(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.internal_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    match bearer_token(&request) {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!("rejected diagnostics call with a wrong internal token");
            Err(StatusCode::FORBIDDEN)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_shows_a_token() {
        let config = AuthConfig {
            internal_token: Some("internal-secret".to_string()),
            verify_token: Some("verify-secret".to_string()),
        };
        let output = format!("{config:?}");
        assert!(!output.contains("internal-secret"));
        assert!(!output.contains("verify-secret"));
        assert!(output.contains("[redacted]"));
    }

    #[test]
    fn default_config_has_no_tokens() {
        let config = AuthConfig::default();
        assert!(config.internal_token.is_none());
        assert!(config.verify_token.is_none());
    }

    fn request_with_auth(value: &str) -> Request {
        axum::http::Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[test]
    fn bearer_extraction_requires_the_scheme_prefix() {
        assert_eq!(bearer_token(&request_with_auth("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&request_with_auth("abc123")), None);
    }
}
