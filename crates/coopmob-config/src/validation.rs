// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that run after deserialization.
//!
//! Serde attributes guarantee types and known keys; the checks here cover
//! what they cannot: address shapes, empty identifiers, zero TTL windows.
//! Every failed check is collected so one run reports them all.

use crate::diagnostic::ConfigError;
use crate::model::CoopmobConfig;

/// Check a deserialized configuration for semantic problems.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &CoopmobConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host is empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err() && !is_hostname_like(host) {
        fail(format!(
            "server.host `{host}` is neither an IP address nor a hostname"
        ));
    }

    if config.panel.database_path.trim().is_empty() {
        fail("panel.database_path is empty".to_string());
    }

    // A zero TTL would expire contexts or dedup marks immediately.
    if config.store.lead_ttl_days == 0 {
        fail("store.lead_ttl_days must be at least 1".to_string());
    }
    if config.store.seen_ttl_secs == 0 {
        fail("store.seen_ttl_secs must be at least 1".to_string());
    }

    if config.catalog.sheet_id.trim().is_empty() {
        fail("catalog.sheet_id is empty (the city catalog cannot be fetched)".to_string());
    }

    if config.gemini.model.trim().is_empty() {
        fail("gemini.model is empty".to_string());
    }

    if config.funnel.registration_link.trim().is_empty() {
        fail("funnel.registration_link is empty".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn is_hostname_like(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':'))
}
