// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation context and its store binding.
//!
//! Context is a single JSON value under `lead_ctx:{user}`. Webhook handling
//! is stateless, so everything the funnel knows about a user lives here.
//! Reads degrade to a fresh context and writes are log-only on failure; the
//! conversation must survive a flaky cache.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use coopmob_core::{ContextStore, MenuSnapshot, UserId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::disc::TraitScores;
use crate::stage::Stage;

/// Selected listing, snapshotted at selection time.
///
/// A copy, not a reference: the catalog row may close or change before the
/// lead record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VagaSnapshot {
    pub vaga_id: String,
    pub farmacia: String,
    pub turno: String,
    pub taxa_entrega: String,
}

/// Everything known about one user's progress through the funnel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_moto: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_cnh: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_android: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disc_answers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_trait_scores: Option<TraitScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analise_perfil: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aprovado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaga: Option<VagaSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_menu: Option<MenuSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_idx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_intro: Option<bool>,
    pub invalid_count: u32,
    pub off_context_count: u32,
    /// Unix seconds of the last processed inbound turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<f64>,
    /// Unix seconds of the last intro send, for the 10-second debounce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_sent_at: Option<f64>,
}

/// Current time as unix seconds.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Storage key for a user's context.
pub fn context_key(user: &UserId) -> String {
    format!("lead_ctx:{user}")
}

/// Load/save facade over the context store.
///
/// Two near-simultaneous deliveries for the same user race on save;
/// last-write-wins is accepted for a single-human chat.
#[derive(Clone)]
pub struct ContextHandle {
    store: Arc<dyn ContextStore>,
    ttl: Duration,
}

impl ContextHandle {
    pub fn new(store: Arc<dyn ContextStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Reads the user's context, or a fresh one on miss, corruption, or
    /// store failure.
    pub async fn load(&self, user: &UserId) -> LeadContext {
        let key = context_key(user);
        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(user = %user, error = %e, "corrupt context, starting fresh");
                    LeadContext::default()
                }
            },
            Ok(None) => LeadContext::default(),
            Err(e) => {
                warn!(user = %user, error = %e, "context read failed, starting fresh");
                LeadContext::default()
            }
        }
    }

    /// Persists the user's context. Failures are logged, never raised.
    pub async fn save(&self, user: &UserId, ctx: &LeadContext) {
        let key = context_key(user);
        let raw = match serde_json::to_string(ctx) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user = %user, error = %e, "context serialize failed");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, &raw, Some(self.ttl)).await {
            warn!(user = %user, error = %e, "context write failed");
        }
    }
}
