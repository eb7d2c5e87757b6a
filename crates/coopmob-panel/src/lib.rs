// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leads API backing the CoopMob recruiting panel.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer concurrency
//! model via `tokio-rusqlite`, exposed over a small axum API: lead upsert
//! and listing, an audit-event trail, and short-lived HMAC-signed URLs for
//! document upload without proxying file bytes.

pub mod auth;
pub mod database;
pub mod handlers;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod server;
pub mod signer;

pub use auth::PanelAuth;
pub use database::Database;
pub use models::{Event, Lead};
pub use server::{PanelConfig, PanelState, build_panel_router, start_panel};
pub use signer::{SignedUrl, UPLOAD_URL_TTL, UploadSigner};
