// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the funnel service.
//!
//! Two groups of routes share one axum server: the WhatsApp webhook pair
//! (`GET /webhook` for the subscription handshake, `POST /webhook` for
//! deliveries) and the operator diagnostics (`/config-check`, `/send-text`,
//! `/send-buttons`, `/llm-ping`, `/agent-ping`). The webhook handler always
//! acknowledges with 200 (every failure is degraded inside the engine) so
//! the channel never retries a delivery we have already claimed.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{
    ConfigCheck, GatewayState, GenAiCheck, InternalApiCheck, RedisCheck, RedisUrlCheck,
    RuntimeCheck, ServerConfig, WhatsappCheck, build_router, start_server,
};
