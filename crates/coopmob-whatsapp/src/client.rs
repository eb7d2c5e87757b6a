// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API (Graph API).
//!
//! Provides [`WhatsappClient`] which implements [`ChannelPort`] for sends
//! and media downloads, with transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use coopmob_core::{ChannelPort, CoopmobError, MediaPayload, MenuItem, UserId};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::payload;

/// Base URL for the Graph API.
const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v19.0";

/// Pause before the single retry a transient send failure gets.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Metadata returned by the Graph API for an uploaded media object.
#[derive(Debug, Deserialize)]
struct MediaMetadata {
    url: Option<String>,
    #[serde(alias = "mime")]
    mime_type: Option<String>,
}

/// WhatsApp Cloud API client.
///
/// Manages the bearer authorization header, connection pooling, and retry
/// logic for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct WhatsappClient {
    client: reqwest::Client,
    phone_number_id: String,
    max_retries: u32,
    base_url: String,
}

impl WhatsappClient {
    /// Creates a new Cloud API client.
    ///
    /// `access_token` becomes the default bearer authorization header;
    /// messages go out from the business number `phone_number_id`.
    pub fn new(access_token: String, phone_number_id: String) -> Result<Self, CoopmobError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|e| {
                CoopmobError::Config(format!("invalid access token header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoopmobError::Channel {
                message: format!("reqwest client construction failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            phone_number_id,
            max_retries: 1,
            base_url: GRAPH_BASE_URL.to_string(),
        })
    }

    /// Points the client at a local mock server instead of the Graph API.
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Posts a message payload to `/{phone_number_id}/messages`.
    ///
    /// A 429/500/503 answer gets one retry after [`RETRY_DELAY`]; anything
    /// else fails immediately with the response body in the error.
    async fn post_message<T: serde::Serialize>(&self, body: &T) -> Result<(), CoopmobError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| CoopmobError::Channel {
                    message: format!("Graph API request did not complete: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "send response received");

            if status.is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            if retryable(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient Graph API failure, retrying");
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }

            return Err(CoopmobError::Channel {
                message: format!("Graph API returned {status}: {body}"),
                source: None,
            });
        }
    }
}

#[async_trait]
impl ChannelPort for WhatsappClient {
    async fn send_text(&self, to: &UserId, body: &str) -> Result<(), CoopmobError> {
        self.post_message(&payload::text_message(to, body)).await
    }

    async fn send_buttons(
        &self,
        to: &UserId,
        body: &str,
        options: &[MenuItem],
    ) -> Result<(), CoopmobError> {
        self.post_message(&payload::buttons_message(to, body, options))
            .await
    }

    async fn send_list(
        &self,
        to: &UserId,
        body: &str,
        options: &[MenuItem],
        button_label: &str,
    ) -> Result<(), CoopmobError> {
        self.post_message(&payload::list_message(to, body, options, button_label))
            .await
    }

    /// Downloads a media object in the Graph API's two-step flow: fetch the
    /// metadata for a short-lived download URL, then fetch the bytes.
    async fn download_media(&self, media_id: &str) -> Result<MediaPayload, CoopmobError> {
        let meta_url = format!("{}/{media_id}", self.base_url);
        let response = self
            .client
            .get(&meta_url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| CoopmobError::Channel {
                message: format!("media metadata request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoopmobError::Channel {
                message: format!("media metadata returned {status}: {body}"),
                source: None,
            });
        }

        let meta: MediaMetadata = response.json().await.map_err(|e| CoopmobError::Channel {
            message: format!("failed to parse media metadata: {e}"),
            source: Some(Box::new(e)),
        })?;

        let url = meta.url.ok_or_else(|| CoopmobError::Channel {
            message: format!("media metadata for {media_id} has no download url"),
            source: None,
        })?;

        let binary = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| CoopmobError::Channel {
                message: format!("media download failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = binary.status();
        if !status.is_success() {
            return Err(CoopmobError::Channel {
                message: format!("media download returned {status}"),
                source: None,
            });
        }

        let bytes = binary.bytes().await.map_err(|e| CoopmobError::Channel {
            message: format!("failed to read media bytes: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(MediaPayload {
            bytes: bytes.to_vec(),
            mime_type: meta.mime_type.unwrap_or_else(|| "audio/ogg".to_string()),
        })
    }
}

/// Statuses the Cloud API hands back for momentary overload or hiccups.
fn retryable(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
