// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across port traits and the CoopMob funnel.

use serde::{Deserialize, Serialize};

/// Channel-scoped end-user identifier (the WhatsApp phone number in international format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of one webhook delivery (the channel message id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A normalized user utterance extracted from a raw channel event.
///
/// Button and list replies carry the full option identifier, never the
/// (possibly truncated) display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Free-typed text.
    Text(String),
    /// Tap on a reply button; `id` is the untruncated option identifier.
    ButtonReply { id: String },
    /// Selection from a list menu; `id` is the untruncated row identifier.
    ListReply { id: String },
    /// Voice note; must be downloaded and transcribed before dispatch.
    Audio { media_id: String },
}

impl Utterance {
    /// The literal text the funnel dispatches on, when already available.
    ///
    /// Audio has no text until transcribed and returns `None`.
    pub fn text(&self) -> Option<&str> {
        match self {
            Utterance::Text(t) => Some(t),
            Utterance::ButtonReply { id } | Utterance::ListReply { id } => Some(id),
            Utterance::Audio { .. } => None,
        }
    }
}

/// One inbound webhook delivery after normalization.
#[derive(Debug, Clone)]
pub struct InboundDelivery {
    pub delivery_id: DeliveryId,
    pub from: UserId,
    /// Display name from channel profile metadata, when the envelope carries one.
    pub profile_name: Option<String>,
    pub utterance: Utterance,
}

/// Raw bytes of a downloaded media object.
#[derive(Clone)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("bytes", &format!("{} bytes", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Kind of interactive prompt last shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    Buttons,
    List,
}

/// One selectable option of an interactive prompt.
///
/// `id` is the full identifier resolved on selection; `title` is the display
/// label and may be truncated by the channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The last interactive prompt issued to a user, kept for idempotent re-display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSnapshot {
    #[serde(rename = "type")]
    pub kind: MenuKind,
    pub body: String,
    pub items: Vec<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_label: Option<String>,
}

/// One open job posting from the catalog feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub vaga_id: String,
    pub farmacia: String,
    pub turno: String,
    pub taxa_entrega: String,
    /// Raw remaining-slots cell; non-numeric values are tolerated upstream.
    #[serde(default)]
    pub vagas_restantes: Option<String>,
}

/// Structured reply from the generative-model agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub content: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Denormalized lead snapshot written once per terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub user_id: String,
    pub nome: Option<String>,
    pub cidade: Option<String>,
    pub req_moto: Option<bool>,
    pub req_cnh: Option<bool>,
    pub req_android: Option<bool>,
    pub disc_score: Option<u8>,
    pub aprovado: Option<bool>,
    pub vaga_id: Option<String>,
    pub turno: Option<String>,
    pub farmacia: Option<String>,
    pub taxa_entrega: Option<String>,
    /// Unix epoch seconds at record time.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_text_resolves_by_identifier() {
        let button = Utterance::ButtonReply {
            id: "Q1_A".to_string(),
        };
        assert_eq!(button.text(), Some("Q1_A"));

        let list = Utterance::ListReply {
            id: "V001".to_string(),
        };
        assert_eq!(list.text(), Some("V001"));

        let audio = Utterance::Audio {
            media_id: "media-1".to_string(),
        };
        assert_eq!(audio.text(), None);
    }

    #[test]
    fn menu_snapshot_round_trips_with_type_tag() {
        let snapshot = MenuSnapshot {
            kind: MenuKind::List,
            body: "Selecione uma opção:".to_string(),
            items: vec![
                MenuItem::new("V001", "ID V001").with_description("Turno: Manhã"),
            ],
            button_label: Some("Ver vagas".to_string()),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"type\":\"list\""), "got: {json}");
        let parsed: MenuSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn media_payload_debug_omits_bytes() {
        let media = MediaPayload {
            bytes: vec![0u8; 4096],
            mime_type: "audio/ogg".to_string(),
        };
        let debug = format!("{media:?}");
        assert!(debug.contains("4096 bytes"));
        assert!(!debug.contains("[0,"));
    }
}
