// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and server lifecycle for the panel API.

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use coopmob_core::CoopmobError;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{self, PanelAuth};
use crate::database::Database;
use crate::handlers;
use crate::signer::UploadSigner;

/// Shared state behind every panel handler.
///
/// Both the database and the signer are optional: the panel still serves
/// `/health` (and reports what is missing) when either is not configured.
#[derive(Clone)]
pub struct PanelState {
    pub db: Option<Arc<Database>>,
    pub signer: Option<Arc<UploadSigner>>,
    pub auth: PanelAuth,
}

/// Bind address for the panel server.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble the panel router: open lead routes plus the token-gated
/// signed-URL endpoint.
pub fn build_panel_router(state: PanelState) -> Router {
    let auth_state = state.auth.clone();
    let open = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/leads",
            post(handlers::upsert_lead).get(handlers::list_leads),
        );
    let gated = Router::new()
        .route("/api/upload/signed-url", post(handlers::signed_url))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth::require_panel_token,
        ));
    open.merge(gated).with_state(state)
}

/// Bind and serve the panel until the process is stopped.
///
/// The panel is consumed by a browser dashboard on another origin, so the
/// served app is wrapped in a permissive CORS layer.
pub async fn start_panel(config: &PanelConfig, state: PanelState) -> Result<(), CoopmobError> {
    let app = build_panel_router(state).layer(CorsLayer::permissive());
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CoopmobError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "panel API listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| CoopmobError::Internal(format!("panel server terminated: {e}")))?;
    Ok(())
}
