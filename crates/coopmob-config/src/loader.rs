// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Later layers override earlier ones: compiled defaults, then
//! `/etc/coopmob/coopmob.toml`, the XDG user file, `./coopmob.toml`, and
//! finally `COOPMOB_*` environment variables. Missing files are skipped
//! silently.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CoopmobConfig;

/// Section tables of `CoopmobConfig`, in the order the env mapper tries them.
const SECTION_NAMES: [&str; 8] = [
    "whatsapp", "gemini", "store", "catalog", "sheets", "funnel", "server", "panel",
];

/// Load configuration from the full hierarchy with env var overrides.
pub fn load_config() -> Result<CoopmobConfig, figment::Error> {
    hierarchy().extract()
}

/// Load configuration from a TOML string over the compiled defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<CoopmobConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CoopmobConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<CoopmobConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CoopmobConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn hierarchy() -> Figment {
    let user_file = dirs::config_dir()
        .map(|dir| dir.join("coopmob/coopmob.toml"))
        .unwrap_or_default();

    Figment::new()
        .merge(Serialized::defaults(CoopmobConfig::default()))
        .merge(Toml::file("/etc/coopmob/coopmob.toml"))
        .merge(Toml::file(user_file))
        .merge(Toml::file("coopmob.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `COOPMOB_SECTION_FIELD` onto `section.field`.
///
/// Only the leading section name becomes a dot; the rest of the key keeps
/// its underscores. `Env::split("_")` would instead split inside field
/// names and turn `whatsapp.access_token` into `whatsapp.access.token`.
fn env_provider() -> Env {
    Env::prefixed("COOPMOB_").map(|key| {
        // Keys arrive lowercased with the prefix already stripped, e.g.
        // COOPMOB_WHATSAPP_ACCESS_TOKEN -> "whatsapp_access_token".
        let key = key.as_str();
        for section in SECTION_NAMES {
            if let Some(field) = key
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return format!("{section}.{field}").into();
            }
        }
        key.to_string().into()
    })
}
