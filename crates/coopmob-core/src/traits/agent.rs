// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative-model agent port for off-script fallback and transcription.

use async_trait::async_trait;

use crate::error::CoopmobError;
use crate::types::{AgentReply, MediaPayload, UserId};

/// Port over the hosted generative-model agent.
///
/// Sessions are keyed by user id so the model keeps per-user history. The
/// funnel only reaches for this port when no deterministic rule applies.
#[async_trait]
pub trait AgentPort: Send + Sync {
    /// Forwards an off-script utterance to the agent session.
    ///
    /// `stage` is the canonical stage name, included so the model knows where
    /// the user is in the funnel.
    async fn ask(
        &self,
        user_id: &UserId,
        stage: Option<&str>,
        text: &str,
    ) -> Result<AgentReply, CoopmobError>;

    /// Transcribes a voice note to Brazilian Portuguese text.
    async fn transcribe(&self, media: &MediaPayload) -> Result<String, CoopmobError>;
}
