// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `coopmob panel` command implementation.
//!
//! Opens the SQLite lead store (running its migrations), builds the upload
//! signer when one is configured, and serves the panel API.

use std::sync::Arc;

use coopmob_config::CoopmobConfig;
use coopmob_core::CoopmobError;
use coopmob_panel::{Database, PanelAuth, PanelConfig, PanelState, UploadSigner, start_panel};
use tracing::{info, warn};

/// Runs the `coopmob panel` command.
///
/// The database is required; the signer is optional and the signed-url
/// endpoint answers 500 while it is missing.
pub async fn run_panel(
    config: &CoopmobConfig,
    host: String,
    port: u16,
) -> Result<(), CoopmobError> {
    info!(
        path = config.panel.database_path.as_str(),
        "opening panel database"
    );
    let db = Database::open(&config.panel.database_path)
        .await
        .map_err(|e| {
            eprintln!(
                "error: failed to open the panel database at {}: {e}",
                config.panel.database_path
            );
            e
        })?;

    let signer = match (
        config.panel.upload_bucket_base.as_deref(),
        config.panel.upload_signing_secret.as_deref(),
    ) {
        (Some(bucket_base), Some(secret)) => {
            info!(bucket_base, "upload signing ready");
            Some(Arc::new(UploadSigner::new(bucket_base, secret)))
        }
        _ => {
            warn!("upload signing disabled (bucket base or signing secret missing)");
            None
        }
    };

    let state = PanelState {
        db: Some(Arc::new(db)),
        signer,
        auth: PanelAuth {
            internal_token: config.server.internal_api_token.clone(),
        },
    };

    start_panel(&PanelConfig { host, port }, state).await
}
