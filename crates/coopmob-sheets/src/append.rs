// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Sheets lead sink.
//!
//! The target sheet is operator-owned; its header row decides column order.
//! Every append first reads row 1, positions the known fields under their
//! headers, and leaves unrecognized headers with the raw record value of the
//! same name (or blank).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use coopmob_core::{CoopmobError, LeadRecord, LeadSink};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

/// Base URL for the Sheets REST API.
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Appends lead rows to the operator spreadsheet.
pub struct SheetSink {
    client: reqwest::Client,
    spreadsheet_id: String,
    sheet_title: String,
    base_url: String,
}

impl SheetSink {
    pub fn new(
        append_token: String,
        spreadsheet_id: String,
        sheet_title: String,
    ) -> Result<Self, CoopmobError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {append_token}")).map_err(|e| {
                CoopmobError::Config(format!("invalid append token header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoopmobError::Provider {
                message: format!("reqwest client construction failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            spreadsheet_id,
            sheet_title,
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// Points the client at a local mock server instead of the live API.
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn fetch_header(&self) -> Result<Vec<String>, CoopmobError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}!1:1",
            self.base_url, self.spreadsheet_id, self.sheet_title
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoopmobError::Provider {
                message: format!("sheet header request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoopmobError::Provider {
                message: format!("sheet header request returned {status}: {body}"),
                source: None,
            });
        }

        let range: ValueRange = response.json().await.map_err(|e| CoopmobError::Provider {
            message: format!("failed to parse sheet header: {e}"),
            source: Some(Box::new(e)),
        })?;

        range
            .values
            .into_iter()
            .next()
            .ok_or_else(|| CoopmobError::Provider {
                message: format!("sheet `{}` has no header row", self.sheet_title),
                source: None,
            })
    }
}

#[async_trait]
impl LeadSink for SheetSink {
    async fn append_lead(
        &self,
        record: &LeadRecord,
        analysis: Option<&str>,
    ) -> Result<(), CoopmobError> {
        let header = self.fetch_header().await?;
        let row: Vec<String> = header
            .iter()
            .map(|column| cell_for(column, record, analysis))
            .collect();

        let url = format!(
            "{}/spreadsheets/{}/values/{}!A1:append?valueInputOption=USER_ENTERED",
            self.base_url, self.spreadsheet_id, self.sheet_title
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| CoopmobError::Provider {
                message: format!("sheet append request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoopmobError::Provider {
                message: format!("sheet append returned {status}: {body}"),
                source: None,
            });
        }

        debug!(user_id = %record.user_id, "lead row appended to sheet");
        Ok(())
    }
}

/// Value for one header cell: known headers map to formatted fields, other
/// headers fall back to the record field of the same name, then to blank.
fn cell_for(column: &str, record: &LeadRecord, analysis: Option<&str>) -> String {
    match column {
        "DATA_ISO" => Utc::now().to_rfc3339(),
        "NOME" => record.nome.clone().unwrap_or_default(),
        "TELEFONE" => record.user_id.clone(),
        "PERFIL_APROVADO" => {
            if record.aprovado == Some(true) {
                "Sim".to_string()
            } else {
                "Não".to_string()
            }
        }
        "PERFIL_NOTA" => record
            .disc_score
            .map(|score| score.to_string())
            .unwrap_or_default(),
        "PROTOCOLO" => format!("{}-{}", record.timestamp, record.user_id),
        "TURNO_ESCOLHIDO" => record.turno.clone().unwrap_or_default(),
        "VAGA_ID" => record.vaga_id.clone().unwrap_or_default(),
        "FARMACIA" => record.farmacia.clone().unwrap_or_default(),
        "CIDADE" => record.cidade.clone().unwrap_or_default(),
        "TAXA_ENTREGA" => record.taxa_entrega.clone().unwrap_or_default(),
        "ANALISE_PERFIL" => analysis.unwrap_or_default().to_string(),
        other => record_field(record, other).unwrap_or_default(),
    }
}

fn record_field(record: &LeadRecord, name: &str) -> Option<String> {
    match name {
        "user_id" => Some(record.user_id.clone()),
        "nome" => record.nome.clone(),
        "cidade" => record.cidade.clone(),
        "req_moto" => record.req_moto.map(|v| v.to_string()),
        "req_cnh" => record.req_cnh.map(|v| v.to_string()),
        "req_android" => record.req_android.map(|v| v.to_string()),
        "disc_score" => record.disc_score.map(|v| v.to_string()),
        "aprovado" => record.aprovado.map(|v| v.to_string()),
        "vaga_id" => record.vaga_id.clone(),
        "turno" => record.turno.clone(),
        "farmacia" => record.farmacia.clone(),
        "taxa_entrega" => record.taxa_entrega.clone(),
        "timestamp" => Some(record.timestamp.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> LeadRecord {
        LeadRecord {
            user_id: "5511999999999".to_string(),
            nome: Some("Maria".to_string()),
            cidade: Some("São Paulo".to_string()),
            req_moto: Some(true),
            req_cnh: Some(true),
            req_android: Some(true),
            disc_score: Some(4),
            aprovado: Some(true),
            vaga_id: Some("V001".to_string()),
            turno: Some("Manhã".to_string()),
            farmacia: Some("Farmácia Central".to_string()),
            taxa_entrega: Some("R$ 7,00".to_string()),
            timestamp: 1_755_000_000,
        }
    }

    fn sink(base_url: &str) -> SheetSink {
        SheetSink::new(
            "ya29.test-token".into(),
            "sheet-leads".into(),
            "Leads".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    #[tokio::test]
    async fn append_maps_values_under_sheet_header_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!1:1"))
            .and(header("authorization", "Bearer ya29.test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Leads!1:1",
                "values": [["TELEFONE", "NOME", "PERFIL_APROVADO", "PROTOCOLO", "CIDADE"]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!A1:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(body_partial_json(serde_json::json!({
                "values": [[
                    "5511999999999",
                    "Maria",
                    "Sim",
                    "1755000000-5511999999999",
                    "São Paulo"
                ]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updates": {"updatedRows": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        sink(&server.uri()).append_lead(&record(), None).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_header_falls_back_to_record_field_or_blank() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!1:1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["user_id", "OBSERVACOES", "ANALISE_PERFIL"]]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!A1:append"))
            .and(body_partial_json(serde_json::json!({
                "values": [["5511999999999", "", "Perfil do Candidato: dominante D"]]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sink(&server.uri())
            .append_lead(&record(), Some("Perfil do Candidato: dominante D"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_header_row_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!1:1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Leads!1:1"
            })))
            .mount(&server)
            .await;

        let result = sink(&server.uri()).append_lead(&record(), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejected_append_surfaces_as_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!1:1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["TELEFONE"]]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-leads/values/Leads!A1:append"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"message": "The caller does not have permission"}
            })))
            .mount(&server)
            .await;

        let result = sink(&server.uri()).append_lead(&record(), None).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("403"), "got: {err}");
    }

    #[test]
    fn perfil_aprovado_defaults_to_nao() {
        let mut rejected = record();
        rejected.aprovado = Some(false);
        assert_eq!(cell_for("PERFIL_APROVADO", &rejected, None), "Não");

        rejected.aprovado = None;
        assert_eq!(cell_for("PERFIL_APROVADO", &rejected, None), "Não");
    }
}
