// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token gate for the panel's privileged endpoints.

use std::fmt;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;

/// Token the upload endpoint requires. When unset the gate is open, which is
/// the local-development mode.
#[derive(Clone, Default)]
pub struct PanelAuth {
    pub internal_token: Option<String>,
}

impl fmt::Debug for PanelAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelAuth")
            .field(
                "internal_token",
                &self.internal_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware enforcing `Authorization: Bearer <token>` on gated routes.
///
/// A missing or malformed header is 401; a present-but-wrong token is 403.
pub async fn require_panel_token(
    State(auth): State<PanelAuth>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.internal_token.as_deref() else {
        return Ok(next.run(request).await);
    };
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match bearer {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => Err(StatusCode::FORBIDDEN),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_token() {
        let auth = PanelAuth {
            internal_token: Some("panel-token".to_string()),
        };
        let out = format!("{auth:?}");
        assert!(out.contains("[redacted]"));
        assert!(!out.contains("panel-token"));
    }

    #[test]
    fn default_gate_is_open() {
        assert!(PanelAuth::default().internal_token.is_none());
    }
}
