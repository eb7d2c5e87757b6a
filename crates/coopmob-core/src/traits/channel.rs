// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging port for the chat channel.

use async_trait::async_trait;

use crate::error::CoopmobError;
use crate::types::{MediaPayload, MenuItem, UserId};

/// Port for sending prompts through the messaging channel.
///
/// Implementations must sanitize option display titles to the channel's
/// length limits (20 chars for buttons, 24 for list rows) while sending the
/// full option identifier untouched; selection is resolved by identifier,
/// never by truncated title. Every send returns an explicit result; retry
/// and ignore policy is decided by the caller, not at the call site.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, to: &UserId, body: &str) -> Result<(), CoopmobError>;

    /// Sends an interactive prompt with up to 3 reply buttons.
    async fn send_buttons(
        &self,
        to: &UserId,
        body: &str,
        options: &[MenuItem],
    ) -> Result<(), CoopmobError>;

    /// Sends an interactive list menu for larger option sets.
    async fn send_list(
        &self,
        to: &UserId,
        body: &str,
        options: &[MenuItem],
        button_label: &str,
    ) -> Result<(), CoopmobError>;

    /// Downloads a media object (voice note) from the channel's media store.
    async fn download_media(&self, media_id: &str) -> Result<MediaPayload, CoopmobError>;
}
