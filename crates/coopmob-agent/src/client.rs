// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` REST API.
//!
//! Provides [`GeminiAgent`] which implements [`AgentPort`]: free-form
//! conversation with a per-user rolling history, and audio transcription.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use coopmob_core::{AgentPort, AgentReply, CoopmobError, MediaPayload, UserId};
use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract;

/// Base URL for the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Pause before the single retry a transient model failure gets.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Rolling history keeps at most this many turns per user.
const HISTORY_LIMIT: usize = 20;

/// Prompt appended after the audio part when transcribing.
const TRANSCRIBE_PROMPT: &str =
    "Transcreva o áudio em português do Brasil. Responda apenas com a transcrição, sem comentários.";

/// Persona and answer-format instructions, sent as the system instruction
/// on every conversational call.
const SYSTEM_INSTRUCTION: &str = "\
Você é a Kelly, especialista em recrutamento da CoopMob, uma cooperativa de \
entregadores. Seja acolhedora, clara e sempre trate o candidato pelo primeiro \
nome quando ele estiver disponível.\n\
\n\
O funil de cadastro (cidade de atuação, requisitos, questionário de perfil e \
escolha de vaga) é conduzido pelo sistema. Quando o candidato fizer uma \
pergunta fora do funil, responda a dúvida de forma breve e convide a pessoa a \
continuar da etapa em que parou.\n\
\n\
Quando oferecer escolhas ao candidato, responda em JSON no formato \
{\"content\": \"...\", \"options\": [\"...\"]}. Caso contrário, responda \
apenas com o texto da mensagem.\n\
\n\
Nunca invente informações sobre vagas, taxas ou cidades. Se não souber, diga \
que a equipe pode confirmar os detalhes.";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: impl Into<String>, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// One stored conversation turn (role is `user` or `model`).
#[derive(Debug, Clone)]
struct Turn {
    role: &'static str,
    text: String,
}

/// Gemini REST client with per-user conversation history.
///
/// History lives in memory only; it scopes the model's context, while the
/// funnel state itself is persisted elsewhere.
#[derive(Clone)]
pub struct GeminiAgent {
    client: reqwest::Client,
    model: String,
    transcribe_model: String,
    max_retries: u32,
    history: Arc<DashMap<String, Vec<Turn>>>,
    base_url: String,
}

impl std::fmt::Debug for GeminiAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAgent")
            .field("model", &self.model)
            .field("transcribe_model", &self.transcribe_model)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GeminiAgent {
    /// Creates a new Gemini client.
    ///
    /// `api_key` rides along on every call as the `x-goog-api-key` header.
    /// Conversation uses `model`; audio transcription uses
    /// `transcribe_model`, which may be the same name.
    pub fn new(
        api_key: String,
        model: String,
        transcribe_model: String,
    ) -> Result<Self, CoopmobError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|e| CoopmobError::Config(format!("invalid API key header value: {e}")))?,
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
            model,
            transcribe_model,
            max_retries: 1,
            history: Arc::new(DashMap::new()),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Conversational model name (reported by the diagnostics endpoints).
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Points the client at a local mock server instead of the live API.
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Calls `models/{model}:generateContent` and joins the first
    /// candidate's text parts.
    ///
    /// A 429/500/503 answer gets one retry after [`RETRY_DELAY`]; anything
    /// else fails immediately with the response body in the error.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<String, CoopmobError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .timeout(timeout)
                .json(request)
                .send()
                .await
                .map_err(|e| CoopmobError::Provider {
                    message: format!("model request did not complete: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model, "model response received");

            if status.is_success() {
                let body: GenerateResponse =
                    response.json().await.map_err(|e| CoopmobError::Provider {
                        message: format!("failed to parse model response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return candidate_text(&body).ok_or_else(|| CoopmobError::Provider {
                    message: "model response carried no text".into(),
                    source: None,
                });
            }

            let body = response.text().await.unwrap_or_default();
            if retryable(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient model failure, retrying");
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }

            return Err(CoopmobError::Provider {
                message: format!("model API returned {status}: {body}"),
                source: None,
            });
        }
    }

    /// Raw single-shot call without persona or history, used by the
    /// `/llm-ping` diagnostics endpoint.
    pub async fn ping(&self) -> Result<String, CoopmobError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part::text("ping")],
            }],
            system_instruction: None,
        };
        self.generate(&self.model, &request, Duration::from_secs(30))
            .await
    }

    fn contents_for(&self, user_id: &UserId, prompt: &str) -> Vec<Content> {
        let mut contents: Vec<Content> = self
            .history
            .get(&user_id.0)
            .map(|turns| {
                turns
                    .iter()
                    .map(|turn| Content {
                        role: Some(turn.role.to_string()),
                        parts: vec![Part::text(turn.text.clone())],
                    })
                    .collect()
            })
            .unwrap_or_default();
        contents.push(Content {
            role: Some("user".into()),
            parts: vec![Part::text(prompt)],
        });
        contents
    }

    fn record_turns(&self, user_id: &UserId, prompt: String, reply: String) {
        let mut turns = self.history.entry(user_id.0.clone()).or_default();
        turns.push(Turn {
            role: "user",
            text: prompt,
        });
        turns.push(Turn {
            role: "model",
            text: reply,
        });
        if turns.len() > HISTORY_LIMIT {
            let excess = turns.len() - HISTORY_LIMIT;
            turns.drain(..excess);
        }
    }
}

#[async_trait]
impl AgentPort for GeminiAgent {
    /// Sends a user message through the Kelly persona.
    ///
    /// When `stage` is given the message is prefixed with the current funnel
    /// context so the model can steer the candidate back. Options embedded in
    /// the reply (structured or enumerated in prose) are surfaced so the
    /// caller can render them as a menu.
    async fn ask(
        &self,
        user_id: &UserId,
        stage: Option<&str>,
        text: &str,
    ) -> Result<AgentReply, CoopmobError> {
        let prompt = match stage {
            Some(stage) => format!("Contexto atual: {stage}. Mensagem do usuário: {text}"),
            None => text.to_string(),
        };

        let request = GenerateRequest {
            contents: self.contents_for(user_id, &prompt),
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
        };

        let raw = self
            .generate(&self.model, &request, Duration::from_secs(30))
            .await?;
        self.record_turns(user_id, prompt, raw.clone());

        let mut reply = extract::reply_from_text(&raw);
        if reply.options.is_none() {
            let inferred = extract::extract_options_from_text(&reply.content);
            if inferred.len() >= 2 {
                reply.options = Some(inferred);
            }
        }
        Ok(reply)
    }

    /// Transcribes an audio message to Brazilian Portuguese text.
    async fn transcribe(&self, media: &MediaPayload) -> Result<String, CoopmobError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&media.bytes);
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![
                    Part::inline_data(media.mime_type.clone(), encoded),
                    Part::text(TRANSCRIBE_PROMPT),
                ],
            }],
            system_instruction: None,
        };

        let raw = self
            .generate(&self.transcribe_model, &request, Duration::from_secs(60))
            .await?;
        Ok(raw.trim().to_string())
    }
}

/// Joins the text parts of the first candidate, if any.
fn candidate_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let content = candidate.content.as_ref()?;
    let texts: Vec<&str> = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();
    if texts.is_empty() {
        return None;
    }
    Some(texts.join("\n"))
}

/// Statuses the Generative Language API hands back for momentary overload.
fn retryable(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn agent_for(server_url: &str) -> GeminiAgent {
        GeminiAgent::new(
            "test-gemini-key".into(),
            "gemini-1.5-flash".into(),
            "gemini-1.5-flash".into(),
        )
        .unwrap()
        .with_base_url(server_url.to_string())
    }

    fn user() -> UserId {
        UserId("5511999999999".to_string())
    }

    fn model_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]}
            }]
        })
    }

    #[tokio::test]
    async fn ask_sends_api_key_and_system_instruction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-gemini-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("Oi! Sou a Kelly.")))
            .expect(1)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let reply = agent.ask(&user(), None, "oi").await.unwrap();
        assert_eq!(reply.content, "Oi! Sou a Kelly.");
        assert_eq!(reply.options, None);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Kelly"));
    }

    #[tokio::test]
    async fn ask_prefixes_stage_context() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [{"text": "Contexto atual: req_moto. Mensagem do usuário: qual a taxa?"}]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("A taxa varia.")))
            .expect(1)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        agent
            .ask(&user(), Some("req_moto"), "qual a taxa?")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ask_carries_history_on_second_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("resposta")))
            .expect(2)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        agent.ask(&user(), None, "primeira").await.unwrap();
        agent.ask(&user(), None, "segunda").await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let second: serde_json::Value = requests[1].body_json().unwrap();
        let contents = second["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["parts"][0]["text"], "primeira");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "segunda");
    }

    #[tokio::test]
    async fn ask_parses_structured_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                r#"{"content": "Prefere qual turno?", "options": ["Manhã", "Tarde"]}"#,
            )))
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let reply = agent.ask(&user(), None, "turnos?").await.unwrap();
        assert_eq!(reply.content, "Prefere qual turno?");
        assert_eq!(
            reply.options,
            Some(vec!["Manhã".to_string(), "Tarde".to_string()])
        );
    }

    #[tokio::test]
    async fn ask_infers_options_from_prose() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(
                "Os turnos disponíveis são: Manhã, Tarde ou Noite",
            )))
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let reply = agent.ask(&user(), None, "quais turnos?").await.unwrap();
        assert_eq!(
            reply.options,
            Some(vec![
                "Manhã".to_string(),
                "Tarde".to_string(),
                "Noite".to_string()
            ])
        );
    }

    #[tokio::test]
    async fn ask_retries_once_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("ok")))
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let reply = agent.ask(&user(), None, "oi").await.unwrap();
        assert_eq!(reply.content, "ok");
    }

    #[tokio::test]
    async fn ask_fails_fast_on_400() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "API key not valid"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let result = agent.ask(&user(), None, "oi").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_candidates_are_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let result = agent.ask(&user(), None, "oi").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transcribe_sends_inline_audio() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "audio/ogg"}},
                        {"text": TRANSCRIBE_PROMPT}
                    ]
                }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(model_reply("  Olá, tudo bem?  ")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let media = MediaPayload {
            bytes: b"OggS...".to_vec(),
            mime_type: "audio/ogg".to_string(),
        };
        let text = agent.transcribe(&media).await.unwrap();
        assert_eq!(text, "Olá, tudo bem?");
    }

    #[tokio::test]
    async fn ping_sends_bare_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "ping"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("pong")))
            .expect(1)
            .mount(&server)
            .await;

        let agent = agent_for(&server.uri());
        let text = agent.ping().await.unwrap();
        assert_eq!(text, "pong");
    }

    #[test]
    fn debug_omits_history_and_key() {
        let agent = GeminiAgent::new("secret".into(), "m".into(), "t".into()).unwrap();
        let rendered = format!("{agent:?}");
        assert!(!rendered.contains("secret"));
    }
}
