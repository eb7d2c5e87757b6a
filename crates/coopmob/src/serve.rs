// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `coopmob serve` command implementation.
//!
//! Wires the configured adapters -- WhatsApp channel, city catalog, Gemini
//! agent, context store, sheet sink -- into the funnel engine and serves the
//! webhook and diagnostics routes until the process is stopped.

use std::sync::Arc;
use std::time::Duration;

use coopmob_agent::GeminiAgent;
use coopmob_config::CoopmobConfig;
use coopmob_core::{AgentPort, CatalogPort, ChannelPort, CoopmobError, LeadSink};
use coopmob_funnel::{FunnelEngine, FunnelSettings};
use coopmob_gateway::{
    AuthConfig, ConfigCheck, GatewayState, GenAiCheck, InternalApiCheck, RedisCheck, RedisUrlCheck,
    RuntimeCheck, ServerConfig, WhatsappCheck, start_server,
};
use coopmob_sheets::{CityCatalog, SheetSink};
use coopmob_whatsapp::WhatsappClient;
use tracing::{info, warn};

/// Runs the `coopmob serve` command.
///
/// Every adapter that can be absent (Gemini, Redis, the sheet sink) degrades
/// with a log line instead of failing startup, so a half-configured
/// deployment still serves `/config-check`.
pub async fn run_serve(config: CoopmobConfig) -> Result<(), CoopmobError> {
    info!("starting coopmob serve");

    // Channel. The client is built even with empty credentials: sends fail
    // until they are set, but the webhook and /config-check stay reachable.
    let access_token = config.whatsapp.access_token.clone().unwrap_or_default();
    let phone_number_id = config.whatsapp.phone_number_id.clone().unwrap_or_default();
    if access_token.is_empty() || phone_number_id.is_empty() {
        warn!("whatsapp credentials missing; outbound sends will fail until configured");
    }
    let channel: Arc<dyn ChannelPort> =
        Arc::new(WhatsappClient::new(access_token, phone_number_id).map_err(|e| {
            eprintln!("error: failed to build the WhatsApp client: {e}");
            e
        })?);

    let catalog: Arc<dyn CatalogPort> = Arc::new(CityCatalog::new(
        config.catalog.sheet_id.clone(),
        config.catalog.gid.clone(),
        Duration::from_secs(config.catalog.cache_ttl_secs),
    )?);
    info!(
        sheet_id = config.catalog.sheet_id.as_str(),
        cache_ttl_secs = config.catalog.cache_ttl_secs,
        "city catalog ready"
    );

    let agent = match config.gemini.api_key.clone() {
        Some(api_key) => {
            let agent = GeminiAgent::new(
                api_key,
                config.gemini.model.clone(),
                config.gemini.transcribe_model().to_string(),
            )?;
            info!(model = config.gemini.model.as_str(), "gemini agent ready");
            Some(Arc::new(agent))
        }
        None => {
            info!("gemini agent disabled (no api key configured)");
            None
        }
    };

    let store = coopmob_store::build_store(config.store.redis_url.as_deref()).await?;

    let sink: Option<Arc<dyn LeadSink>> = match (
        config.sheets.append_token.clone(),
        config.sheets.spreadsheet_id.clone(),
    ) {
        (Some(append_token), Some(spreadsheet_id)) => {
            let sink = SheetSink::new(
                append_token,
                spreadsheet_id.clone(),
                config.sheets.leads_sheet_title.clone(),
            )?;
            info!(
                spreadsheet_id = spreadsheet_id.as_str(),
                sheet = config.sheets.leads_sheet_title.as_str(),
                "sheet sink ready"
            );
            Some(Arc::new(sink))
        }
        _ => {
            info!("sheet sink disabled (append token or spreadsheet id missing)");
            None
        }
    };

    let settings = FunnelSettings {
        intro_before_city: config.funnel.intro_before_city,
        max_invalid_per_stage: config.funnel.max_invalid_per_stage,
        max_off_context: config.funnel.max_off_context,
        recap_after: Duration::from_secs(config.funnel.recap_after_minutes * 60),
        registration_link: config.funnel.registration_link.clone(),
        lead_ttl: Duration::from_secs(config.store.lead_ttl_days * 24 * 60 * 60),
        seen_ttl: Duration::from_secs(config.store.seen_ttl_secs),
        ..FunnelSettings::default()
    };

    let engine = Arc::new(FunnelEngine::new(
        Arc::clone(&channel),
        catalog,
        agent.clone().map(|a| a as Arc<dyn AgentPort>),
        store,
        sink,
        settings,
    ));

    let state = GatewayState {
        engine,
        channel,
        agent,
        auth: AuthConfig {
            internal_token: config.server.internal_api_token.clone(),
            verify_token: config.whatsapp.verify_token.clone(),
        },
        check: Arc::new(config_check(&config)),
    };

    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server, state).await
}

/// Builds the `/config-check` presence report from the loaded configuration.
///
/// Only booleans and the URL shape leave this function; no secret value is
/// ever copied into the report.
fn config_check(config: &CoopmobConfig) -> ConfigCheck {
    let phone_number_id = config.whatsapp.phone_number_id.as_deref().unwrap_or("");
    ConfigCheck {
        whatsapp: WhatsappCheck {
            access_token_set: is_set(&config.whatsapp.access_token),
            phone_number_id_set: !phone_number_id.is_empty(),
            phone_number_id_digits: !phone_number_id.is_empty()
                && phone_number_id.chars().all(|c| c.is_ascii_digit()),
            verify_token_set: is_set(&config.whatsapp.verify_token),
        },
        google_genai: GenAiCheck {
            use_vertexai: config.gemini.use_vertexai,
            api_key_set: is_set(&config.gemini.api_key),
        },
        redis: RedisCheck {
            redis_url_set: is_set(&config.store.redis_url),
            parsed: config
                .store
                .redis_url
                .as_deref()
                .and_then(coopmob_store::describe_url)
                .map(|summary| RedisUrlCheck {
                    scheme: summary.scheme,
                    host_set: summary.host_set,
                    port_set: summary.port_set,
                    has_user: summary.has_user,
                    has_password: summary.has_password,
                }),
        },
        internal_api: InternalApiCheck {
            internal_api_token_set: is_set(&config.server.internal_api_token),
        },
        runtime: RuntimeCheck {
            port: config.server.port,
        },
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
