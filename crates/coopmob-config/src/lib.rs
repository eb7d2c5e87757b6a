// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the CoopMob intake funnel.
//!
//! A layered figment setup: compiled defaults, then `/etc/coopmob/`, the
//! XDG config directory, a local `coopmob.toml`, and finally `COOPMOB_*`
//! environment variables. Models are strict (`deny_unknown_fields`) and
//! failures render as miette diagnostics with typo suggestions instead of
//! a serde one-liner.
//!
//! # Usage
//!
//! ```no_run
//! use coopmob_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Webhook port: {}", config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CoopmobConfig;

/// Load the full configuration hierarchy and validate it.
///
/// Deserialization failures come back as rich diagnostics (unknown keys
/// carry spans and suggestions); a config that deserializes cleanly still
/// passes through `validate_config`, which collects every semantic problem
/// rather than stopping at the first.
pub fn load_and_validate() -> Result<CoopmobConfig, Vec<ConfigError>> {
    let config = loader::load_config()
        .map_err(|err| diagnostic::figment_to_config_errors(err, &read_layer_sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load and validate configuration from a TOML string only.
pub fn load_and_validate_str(toml_content: &str) -> Result<CoopmobConfig, Vec<ConfigError>> {
    let config = loader::load_config_from_str(toml_content).map_err(|err| {
        let sources = vec![("<inline>".to_string(), toml_content.to_string())];
        diagnostic::figment_to_config_errors(err, &sources)
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Read the content of every config file layer that exists, keyed by the
/// path figment reports, so diagnostics can point into the right file.
fn read_layer_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/coopmob/coopmob.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("coopmob/coopmob.toml"));
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join("coopmob.toml"))
            .unwrap_or_else(|_| std::path::PathBuf::from("coopmob.toml")),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
