// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and server startup.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use coopmob_agent::GeminiAgent;
use coopmob_core::{ChannelPort, CoopmobError};
use coopmob_funnel::FunnelEngine;

use crate::auth::{AuthConfig, require_internal_token};
use crate::handlers;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The funnel, driving every webhook delivery.
    pub engine: Arc<FunnelEngine>,
    /// Outbound channel for the diagnostics send endpoints.
    pub channel: Arc<dyn ChannelPort>,
    /// Model client for `/llm-ping` and `/agent-ping`; `None` when no key is
    /// configured.
    pub agent: Option<Arc<GeminiAgent>>,
    /// Webhook verify token and internal API token.
    pub auth: AuthConfig,
    /// Presence booleans reported by `/config-check`.
    pub check: Arc<ConfigCheck>,
}

/// Bind address for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Configuration presence report, built by the binary from the loaded
/// configuration. Booleans only; no value ever crosses into a response.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigCheck {
    pub whatsapp: WhatsappCheck,
    pub google_genai: GenAiCheck,
    pub redis: RedisCheck,
    pub internal_api: InternalApiCheck,
    pub runtime: RuntimeCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatsappCheck {
    pub access_token_set: bool,
    pub phone_number_id_set: bool,
    /// The phone-number id must be the numeric Graph id, not the display
    /// number; a non-digit value is the most common misconfiguration.
    pub phone_number_id_digits: bool,
    pub verify_token_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenAiCheck {
    pub use_vertexai: bool,
    pub api_key_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedisCheck {
    pub redis_url_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<RedisUrlCheck>,
}

/// Shape summary of the configured redis URL.
#[derive(Debug, Clone, Serialize)]
pub struct RedisUrlCheck {
    pub scheme: String,
    pub host_set: bool,
    pub port_set: bool,
    pub has_user: bool,
    pub has_password: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InternalApiCheck {
    pub internal_api_token_set: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeCheck {
    pub port: u16,
}

/// Assembles the full route table over `state`.
///
/// The webhook and read-only diagnostics are public; the send endpoints sit
/// behind the internal-token middleware.
pub fn build_router(state: GatewayState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::health_root))
        .route("/config-check", get(handlers::config_check))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/llm-ping", get(handlers::llm_ping))
        .route("/agent-ping", get(handlers::agent_ping))
        .with_state(state.clone());

    let gated = Router::new()
        .route("/send-text", post(handlers::send_text))
        .route("/send-buttons", post(handlers::send_buttons))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            require_internal_token,
        ))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(gated)
        .layer(CorsLayer::permissive())
}

/// Binds and serves until the task is aborted.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), CoopmobError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CoopmobError::Channel {
                message: format!("failed to bind webhook server to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    tracing::info!("webhook server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CoopmobError::Channel {
            message: format!("webhook server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_check_serializes_nested_sections() {
        let check = ConfigCheck {
            whatsapp: WhatsappCheck {
                access_token_set: true,
                phone_number_id_set: true,
                phone_number_id_digits: false,
                verify_token_set: true,
            },
            google_genai: GenAiCheck {
                use_vertexai: false,
                api_key_set: true,
            },
            redis: RedisCheck {
                redis_url_set: true,
                parsed: Some(RedisUrlCheck {
                    scheme: "redis".to_string(),
                    host_set: true,
                    port_set: true,
                    has_user: false,
                    has_password: true,
                }),
            },
            internal_api: InternalApiCheck {
                internal_api_token_set: false,
            },
            runtime: RuntimeCheck { port: 8080 },
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["whatsapp"]["access_token_set"], true);
        assert_eq!(json["whatsapp"]["phone_number_id_digits"], false);
        assert_eq!(json["redis"]["parsed"]["scheme"], "redis");
        assert_eq!(json["runtime"]["port"], 8080);
    }

    #[test]
    fn missing_redis_parse_is_omitted() {
        let check = RedisCheck {
            redis_url_set: false,
            parsed: None,
        };
        let json = serde_json::to_string(&check).unwrap();
        assert!(!json.contains("parsed"));
    }
}
