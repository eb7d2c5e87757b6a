// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value persistence port for conversation context and dedup state.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CoopmobError;

/// Port for the per-user context store and webhook dedup bookkeeping.
///
/// Backed by an external durable cache in production and an in-process map
/// otherwise. Values are opaque strings (serialized JSON); keys are scoped
/// per user identifier, so there is no cross-user leakage by construction.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Reads the value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>, CoopmobError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// `ttl: None` stores without expiry (final lead records); contexts and
    /// dedup keys always pass a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
        -> Result<(), CoopmobError>;

    /// Atomically claims `key` for `ttl`.
    ///
    /// Returns `true` exactly once per key within the TTL window; `false`
    /// when the key was already claimed. This is the dedup primitive and
    /// must be check-and-set when backed by a shared store.
    async fn check_and_set(&self, key: &str, ttl: Duration) -> Result<bool, CoopmobError>;

    /// Appends `value` to the durable list named `list`.
    async fn push_log(&self, list: &str, value: &str) -> Result<(), CoopmobError>;
}
