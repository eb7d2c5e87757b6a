// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes the final lead record when a conversation reaches a terminal
//! transition.
//!
//! Two independent sinks: the durable log in the context store (a global
//! list plus a per-user final key) and, when configured, the spreadsheet.
//! Every failure is logged and swallowed; recording must never break the
//! conversation that triggered it.

use std::sync::Arc;

use coopmob_core::{ContextStore, LeadRecord, LeadSink, UserId};
use tracing::{info, warn};

use crate::context::{LeadContext, now_secs};

/// Global list every finished lead is appended to.
pub const LEADS_LIST: &str = "leads_records";

/// Per-user key holding the latest final record.
pub fn final_record_key(user: &UserId) -> String {
    format!("lead_final:{user}")
}

#[derive(Clone)]
pub struct LeadRecorder {
    store: Arc<dyn ContextStore>,
    sink: Option<Arc<dyn LeadSink>>,
}

impl LeadRecorder {
    pub fn new(store: Arc<dyn ContextStore>, sink: Option<Arc<dyn LeadSink>>) -> Self {
        Self { store, sink }
    }

    /// Flattens the context into the denormalized record shape.
    pub fn build_record(user: &UserId, ctx: &LeadContext) -> LeadRecord {
        LeadRecord {
            user_id: user.to_string(),
            nome: ctx.nome.clone(),
            cidade: ctx.cidade.clone(),
            req_moto: ctx.req_moto,
            req_cnh: ctx.req_cnh,
            req_android: ctx.req_android,
            disc_score: ctx.disc_score,
            aprovado: ctx.aprovado,
            vaga_id: ctx.vaga.as_ref().map(|v| v.vaga_id.clone()),
            turno: ctx.vaga.as_ref().map(|v| v.turno.clone()),
            farmacia: ctx.vaga.as_ref().map(|v| v.farmacia.clone()),
            taxa_entrega: ctx.vaga.as_ref().map(|v| v.taxa_entrega.clone()),
            timestamp: now_secs() as i64,
        }
    }

    /// Records the lead in every configured sink.
    pub async fn record(&self, user: &UserId, ctx: &LeadContext) {
        let record = Self::build_record(user, ctx);
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user = %user, error = %e, "lead record serialize failed");
                return;
            }
        };

        if let Err(e) = self.store.push_log(LEADS_LIST, &raw).await {
            warn!(user = %user, error = %e, "lead log append failed");
        }
        if let Err(e) = self.store.set(&final_record_key(user), &raw, None).await {
            warn!(user = %user, error = %e, "final lead record write failed");
        }

        if let Some(sink) = &self.sink {
            match sink.append_lead(&record, ctx.analise_perfil.as_deref()).await {
                Ok(()) => info!(user = %user, aprovado = ?record.aprovado, "lead appended to sheet"),
                Err(e) => warn!(user = %user, error = %e, "sheet append failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VagaSnapshot;
    use crate::stage::Stage;
    use coopmob_store::MemoryStore;

    #[test]
    fn record_flattens_the_listing_snapshot() {
        let ctx = LeadContext {
            stage: Some(Stage::Final),
            nome: Some("Maria".to_string()),
            cidade: Some("Campinas".to_string()),
            req_moto: Some(true),
            req_cnh: Some(true),
            req_android: Some(true),
            disc_score: Some(4),
            aprovado: Some(true),
            vaga: Some(VagaSnapshot {
                vaga_id: "V001".to_string(),
                farmacia: "Farmácia Central".to_string(),
                turno: "Manhã".to_string(),
                taxa_entrega: "R$ 7,50".to_string(),
            }),
            ..Default::default()
        };
        let user = UserId("5511999990000".to_string());
        let record = LeadRecorder::build_record(&user, &ctx);

        assert_eq!(record.user_id, "5511999990000");
        assert_eq!(record.vaga_id.as_deref(), Some("V001"));
        assert_eq!(record.turno.as_deref(), Some("Manhã"));
        assert_eq!(record.aprovado, Some(true));
        assert!(record.timestamp > 0);
    }

    #[test]
    fn record_without_listing_leaves_fields_empty() {
        let user = UserId("5511999990000".to_string());
        let record = LeadRecorder::build_record(&user, &LeadContext::default());
        assert_eq!(record.vaga_id, None);
        assert_eq!(record.farmacia, None);
    }

    #[tokio::test]
    async fn record_appends_to_log_and_final_key() {
        let store = Arc::new(MemoryStore::new());
        let recorder = LeadRecorder::new(store.clone(), None);
        let user = UserId("5511988887777".to_string());
        let ctx = LeadContext {
            cidade: Some("Santos".to_string()),
            aprovado: Some(false),
            ..Default::default()
        };

        recorder.record(&user, &ctx).await;

        let log = store.log_entries(LEADS_LIST);
        assert_eq!(log.len(), 1);
        assert!(log[0].contains("\"cidade\":\"Santos\""));

        let final_raw = store.get(&final_record_key(&user)).await.unwrap().unwrap();
        let parsed: LeadRecord = serde_json::from_str(&final_raw).unwrap();
        assert_eq!(parsed.aprovado, Some(false));
    }
}
