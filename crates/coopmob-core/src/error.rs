// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the CoopMob intake funnel.

use thiserror::Error;

/// Boxed cause kept alive for error-chain reporting.
pub type ErrorSource = Box<dyn std::error::Error + Send + Sync>;

/// Workspace-wide error type; every port trait and adapter returns it.
#[derive(Debug, Error)]
pub enum CoopmobError {
    /// Configuration material an adapter cannot be built from (bad header
    /// values, unparseable options).
    #[error("bad configuration: {0}")]
    Config(String),

    /// Context/dedup store errors (connection failure, serialization).
    #[error("state store error: {source}")]
    Storage { source: ErrorSource },

    /// Messaging channel errors (send rejected, media download failure, malformed envelope).
    #[error("messaging channel error: {message}")]
    Channel {
        message: String,
        source: Option<ErrorSource>,
    },

    /// Generative-model provider errors (API failure, malformed reply).
    #[error("model provider error: {message}")]
    Provider {
        message: String,
        source: Option<ErrorSource>,
    },

    /// Job-catalog feed errors (fetch failure, CSV parse failure).
    #[error("catalog error: {message}")]
    Catalog { message: String },

    /// Failures with no better home; the catch-all for broken invariants.
    #[error("internal failure: {0}")]
    Internal(String),
}
