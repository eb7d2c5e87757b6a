// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Panel endpoint handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use coopmob_core::CoopmobError;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::models::Lead;
use crate::queries;
use crate::queries::leads::{LeadFilter, LeadPatch};
use crate::server::PanelState;
use crate::signer::SignedUrl;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn server_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(err: CoopmobError) -> ApiError {
    error!(error = %err, "panel request failed");
    server_error("internal error")
}

/// GET `/health`: presence of the two external pieces the panel needs.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db: bool,
    pub bucket: bool,
}

pub async fn health(State(state): State<PanelState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        db: state.db.is_some(),
        bucket: state.signer.is_some(),
    })
}

/// Body for `POST /api/leads`. Only `phone` is required; the rest patch the
/// stored lead when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadUpsertRequest {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// The lead as returned by the API (stored row minus operator-only columns).
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub id: i64,
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub step: String,
    pub status: String,
    pub form_token: Option<String>,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            phone: lead.phone,
            name: lead.name,
            email: lead.email,
            city: lead.city,
            step: lead.step,
            status: lead.status,
            form_token: lead.form_token,
        }
    }
}

/// POST `/api/leads`: create or update the lead keyed by phone, and append
/// a `lead_created` / `lead_updated` audit event carrying the request body.
pub async fn upsert_lead(
    State(state): State<PanelState>,
    Json(request): Json<LeadUpsertRequest>,
) -> Result<Json<LeadResponse>, ApiError> {
    let phone = request.phone.trim().to_string();
    if phone.is_empty() {
        return Err(bad_request("phone required"));
    }
    let Some(db) = state.db.as_ref() else {
        return Err(server_error("database not configured"));
    };

    let patch = LeadPatch {
        name: clean(&request.name),
        email: clean(&request.email),
        city: clean(&request.city),
        source: clean(&request.source),
    };
    let (lead, created) = queries::leads::upsert_lead(db, &phone, &patch)
        .await
        .map_err(internal_error)?;

    let kind = if created { "lead_created" } else { "lead_updated" };
    let payload = serde_json::to_string(&request).ok();
    queries::events::append_event(db, "system", kind, Some(lead.id), payload.as_deref())
        .await
        .map_err(internal_error)?;

    Ok(Json(LeadResponse::from(lead)))
}

/// Query string for `GET /api/leads`.
#[derive(Debug, Deserialize)]
pub struct LeadListParams {
    pub city: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct LeadsListResponse {
    pub total: i64,
    pub items: Vec<LeadResponse>,
}

/// GET `/api/leads`: filtered, paged listing. `total` counts every match,
/// not just the returned page.
pub async fn list_leads(
    State(state): State<PanelState>,
    Query(params): Query<LeadListParams>,
) -> Result<Json<LeadsListResponse>, ApiError> {
    let Some(db) = state.db.as_ref() else {
        return Err(server_error("database not configured"));
    };
    let filter = LeadFilter {
        city: clean(&params.city),
        status: clean(&params.status),
        q: clean(&params.q),
        limit: params.limit.max(0),
        offset: params.offset.max(0),
    };
    let (leads, total) = queries::leads::list_leads(db, &filter)
        .await
        .map_err(internal_error)?;
    Ok(Json(LeadsListResponse {
        total,
        items: leads.into_iter().map(LeadResponse::from).collect(),
    }))
}

/// Body for `POST /api/upload/signed-url`.
#[derive(Debug, Deserialize)]
pub struct SignedUrlRequest {
    pub lead_id: i64,
    /// Document kind, e.g. CNH, CRLV, COMPROVANTE, ANTECEDENTES.
    pub kind: String,
    pub filename: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "upload".to_string()
}

/// POST `/api/upload/signed-url`: sign `leads/{lead_id}/{kind}/{filename}`
/// for a direct PUT (upload) or GET (download) against the bucket.
pub async fn signed_url(
    State(state): State<PanelState>,
    Json(request): Json<SignedUrlRequest>,
) -> Result<Json<SignedUrl>, ApiError> {
    let Some(signer) = state.signer.as_ref() else {
        return Err(server_error("upload signing not configured"));
    };
    let object = format!(
        "leads/{}/{}/{}",
        request.lead_id, request.kind, request.filename
    );
    let method = if request.mode == "upload" { "PUT" } else { "GET" };
    let signed = signer.sign(method, &object).map_err(internal_error)?;
    Ok(Json(signed))
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
