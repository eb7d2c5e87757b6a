// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the CoopMob intake funnel.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. Structs that
//! hold credentials implement `Debug` manually and print `[redacted]`.

use serde::{Deserialize, Serialize};

/// Top-level CoopMob configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoopmobConfig {
    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,

    /// Gemini model settings for the conversational agent.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Context store settings (Redis or in-memory fallback).
    #[serde(default)]
    pub store: StoreConfig,

    /// Published city/listing catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Google Sheets lead-sink settings.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Funnel flow tuning.
    #[serde(default)]
    pub funnel: FunnelConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Recruitment panel settings.
    #[serde(default)]
    pub panel: PanelConfig,
}

/// WhatsApp Cloud API configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsappConfig {
    /// Graph API access token. `None` disables outbound sends.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Phone number id the business messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Shared secret echoed back during webhook subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,
}

impl std::fmt::Debug for WhatsappConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsappConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("phone_number_id", &self.phone_number_id)
            .field(
                "verify_token",
                &self.verify_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Gemini model configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. `None` disables the model-backed fallback.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for conversational fallback replies.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Model used for audio transcription. Falls back to `model` when unset.
    #[serde(default)]
    pub transcribe_model: Option<String>,

    /// Route requests through Vertex AI instead of the public API.
    #[serde(default)]
    pub use_vertexai: bool,
}

impl GeminiConfig {
    /// Model name used for audio transcription.
    pub fn transcribe_model(&self) -> &str {
        self.transcribe_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            transcribe_model: None,
            use_vertexai: false,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("transcribe_model", &self.transcribe_model)
            .field("use_vertexai", &self.use_vertexai)
            .finish()
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Context store configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Redis connection URL. `None` selects the in-memory store.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Days a lead context survives without activity.
    #[serde(default = "default_lead_ttl_days")]
    pub lead_ttl_days: u64,

    /// Seconds a delivery id stays in the dedup window.
    #[serde(default = "default_seen_ttl_secs")]
    pub seen_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            lead_ttl_days: default_lead_ttl_days(),
            seen_ttl_secs: default_seen_ttl_secs(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redis URLs may embed credentials, so only presence is shown.
        f.debug_struct("StoreConfig")
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[redacted]"))
            .field("lead_ttl_days", &self.lead_ttl_days)
            .field("seen_ttl_secs", &self.seen_ttl_secs)
            .finish()
    }
}

fn default_lead_ttl_days() -> u64 {
    30
}

fn default_seen_ttl_secs() -> u64 {
    300
}

/// Published city/listing catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Spreadsheet id of the published vacancies sheet.
    #[serde(default = "default_catalog_sheet_id")]
    pub sheet_id: String,

    /// Tab gid within the spreadsheet.
    #[serde(default = "default_catalog_gid")]
    pub gid: String,

    /// Seconds a fetched catalog snapshot is served before refetch.
    #[serde(default = "default_catalog_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sheet_id: default_catalog_sheet_id(),
            gid: default_catalog_gid(),
            cache_ttl_secs: default_catalog_cache_ttl_secs(),
        }
    }
}

fn default_catalog_sheet_id() -> String {
    "1DESD3YZwOX0vwbelz5vJ6QJybuhPnjUMLhTlYblQt_c".to_string()
}

fn default_catalog_gid() -> String {
    "0".to_string()
}

fn default_catalog_cache_ttl_secs() -> u64 {
    600
}

/// Google Sheets lead-sink configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SheetsConfig {
    /// OAuth bearer token used for the values:append call.
    /// `None` disables the sheet sink.
    #[serde(default)]
    pub append_token: Option<String>,

    /// Spreadsheet id the lead rows are appended to.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Tab title holding the lead rows.
    #[serde(default = "default_leads_sheet_title")]
    pub leads_sheet_title: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            append_token: None,
            spreadsheet_id: None,
            leads_sheet_title: default_leads_sheet_title(),
        }
    }
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field(
                "append_token",
                &self.append_token.as_ref().map(|_| "[redacted]"),
            )
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("leads_sheet_title", &self.leads_sheet_title)
            .finish()
    }
}

fn default_leads_sheet_title() -> String {
    "Leads".to_string()
}

/// Funnel flow tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FunnelConfig {
    /// Run the three-message introduction before asking for the city.
    #[serde(default = "default_intro_before_city")]
    pub intro_before_city: bool,

    /// Invalid menu replies tolerated per stage before escalating the hint.
    #[serde(default = "default_max_invalid_per_stage")]
    pub max_invalid_per_stage: u32,

    /// Off-context agent fallbacks tolerated before suggesting `humano`.
    #[serde(default = "default_max_off_context")]
    pub max_off_context: u32,

    /// Minutes of silence after which the last menu is resent with a recap line.
    #[serde(default = "default_recap_after_minutes")]
    pub recap_after_minutes: u64,

    /// Cooperative registration form offered after a vacancy is chosen.
    #[serde(default = "default_registration_link")]
    pub registration_link: String,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            intro_before_city: default_intro_before_city(),
            max_invalid_per_stage: default_max_invalid_per_stage(),
            max_off_context: default_max_off_context(),
            recap_after_minutes: default_recap_after_minutes(),
            registration_link: default_registration_link(),
        }
    }
}

fn default_intro_before_city() -> bool {
    true
}

fn default_max_invalid_per_stage() -> u32 {
    2
}

fn default_max_off_context() -> u32 {
    3
}

fn default_recap_after_minutes() -> u64 {
    30
}

fn default_registration_link() -> String {
    "https://app.pipefy.com/public/form/v2m7kpB-".to_string()
}

/// Webhook server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the webhook server to.
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to bind the webhook server to.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bearer token protecting the diagnostic endpoints.
    /// `None` leaves them open (local development).
    #[serde(default)]
    pub internal_api_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            internal_api_token: None,
            log_level: default_log_level(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "internal_api_token",
                &self.internal_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Recruitment panel configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// Path to the panel SQLite database file.
    #[serde(default = "default_panel_database_path")]
    pub database_path: String,

    /// Base URL documents are uploaded to / downloaded from.
    #[serde(default)]
    pub upload_bucket_base: Option<String>,

    /// HMAC secret used to sign upload/download URLs.
    /// `None` disables the signed-url endpoint.
    #[serde(default)]
    pub upload_signing_secret: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            database_path: default_panel_database_path(),
            upload_bucket_base: None,
            upload_signing_secret: None,
        }
    }
}

impl std::fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelConfig")
            .field("database_path", &self.database_path)
            .field("upload_bucket_base", &self.upload_bucket_base)
            .field(
                "upload_signing_secret",
                &self.upload_signing_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn default_panel_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("coopmob").join("panel.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("panel.db"))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CoopmobConfig::default();
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.transcribe_model(), "gemini-1.5-flash");
        assert_eq!(config.store.lead_ttl_days, 30);
        assert_eq!(config.store.seen_ttl_secs, 300);
        assert_eq!(config.catalog.gid, "0");
        assert_eq!(config.catalog.cache_ttl_secs, 600);
        assert_eq!(config.sheets.leads_sheet_title, "Leads");
        assert!(config.funnel.intro_before_city);
        assert_eq!(config.funnel.recap_after_minutes, 30);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, "info");
    }

    #[test]
    fn transcribe_model_falls_back_to_model() {
        let mut gemini = GeminiConfig::default();
        assert_eq!(gemini.transcribe_model(), "gemini-1.5-flash");
        gemini.transcribe_model = Some("gemini-1.5-pro".to_string());
        assert_eq!(gemini.transcribe_model(), "gemini-1.5-pro");
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = CoopmobConfig {
            whatsapp: WhatsappConfig {
                access_token: Some("EAAG-secret".to_string()),
                phone_number_id: Some("5550001111".to_string()),
                verify_token: Some("hush".to_string()),
            },
            gemini: GeminiConfig {
                api_key: Some("AIza-secret".to_string()),
                ..GeminiConfig::default()
            },
            server: ServerConfig {
                internal_api_token: Some("internal-secret".to_string()),
                ..ServerConfig::default()
            },
            ..CoopmobConfig::default()
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("EAAG-secret"));
        assert!(!rendered.contains("AIza-secret"));
        assert!(!rendered.contains("internal-secret"));
        assert!(!rendered.contains("hush"));
        assert!(rendered.contains("[redacted]"));
        assert!(rendered.contains("5550001111"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml_str = r#"
[whatsapp]
acess_token = "oops"
"#;
        let result = toml::from_str::<CoopmobConfig>(toml_str);
        assert!(result.is_err());
    }
}
