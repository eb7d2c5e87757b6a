// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook envelope parsing.
//!
//! WhatsApp wraps every delivery in `entry[].changes[].value`; status-only
//! callbacks (sent/delivered/read receipts) arrive in the same shape with no
//! `messages` array. Everything this module cannot resolve to a supported
//! utterance is dropped without a reply.

use coopmob_core::{DeliveryId, InboundDelivery, UserId, Utterance};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<TextContent>,
    pub interactive: Option<InteractiveContent>,
    pub audio: Option<MediaRef>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractiveContent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub button_reply: Option<Reply>,
    pub list_reply: Option<Reply>,
}

#[derive(Debug, Deserialize)]
pub struct Reply {
    pub id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaRef {
    pub id: Option<String>,
}

/// Extract the first message of the envelope as a normalized delivery.
///
/// Returns `None` for status callbacks, unsupported message types, and
/// malformed payloads. The profile name rides along so the funnel can
/// persist it once.
pub fn first_delivery(envelope: &WebhookEnvelope) -> Option<InboundDelivery> {
    let value = &envelope.entry.first()?.changes.first()?.value;
    let message = value.messages.first()?;

    let from = message.from.as_deref()?;
    let delivery_id = message.id.as_deref()?;
    let utterance = resolve_utterance(message)?;

    let profile_name = value
        .contacts
        .first()
        .and_then(|c| c.profile.as_ref())
        .and_then(|p| p.name.clone());

    Some(InboundDelivery {
        delivery_id: DeliveryId(delivery_id.to_string()),
        from: UserId(from.to_string()),
        profile_name,
        utterance,
    })
}

fn resolve_utterance(message: &Message) -> Option<Utterance> {
    match message.kind.as_deref()? {
        "text" => {
            let body = message.text.as_ref()?.body.clone().unwrap_or_default();
            Some(Utterance::Text(body))
        }
        "interactive" => {
            let interactive = message.interactive.as_ref()?;
            match interactive.kind.as_deref()? {
                "button_reply" => {
                    let reply = interactive.button_reply.as_ref()?;
                    Some(Utterance::ButtonReply {
                        id: reply_id(reply)?,
                    })
                }
                "list_reply" => {
                    let reply = interactive.list_reply.as_ref()?;
                    Some(Utterance::ListReply {
                        id: reply_id(reply)?,
                    })
                }
                _ => None,
            }
        }
        "audio" => {
            let media_id = message.audio.as_ref()?.id.clone()?;
            Some(Utterance::Audio { media_id })
        }
        _ => None,
    }
}

/// A tapped option reports both id and title; id wins, title is the fallback.
fn reply_id(reply: &Reply) -> Option<String> {
    reply
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| reply.title.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Option<InboundDelivery> {
        let envelope: WebhookEnvelope = serde_json::from_value(json).unwrap();
        first_delivery(&envelope)
    }

    fn wrap(message: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"id": "123", "changes": [{"field": "messages", "value": {
                "messaging_product": "whatsapp",
                "contacts": [{"wa_id": "5511999999999", "profile": {"name": "Maria"}}],
                "messages": [message]
            }}]}]
        })
    }

    #[test]
    fn text_message_resolves() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.T1",
            "type": "text",
            "text": {"body": "quero ser entregador"}
        })))
        .unwrap();

        assert_eq!(delivery.from.as_str(), "5511999999999");
        assert_eq!(delivery.delivery_id.as_str(), "wamid.T1");
        assert_eq!(delivery.profile_name.as_deref(), Some("Maria"));
        assert_eq!(delivery.utterance.text(), Some("quero ser entregador"));
    }

    #[test]
    fn button_reply_prefers_id_over_title() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.B1",
            "type": "interactive",
            "interactive": {
                "type": "button_reply",
                "button_reply": {"id": "intro_next", "title": "Avançar"}
            }
        })))
        .unwrap();

        assert_eq!(
            delivery.utterance,
            Utterance::ButtonReply {
                id: "intro_next".to_string()
            }
        );
    }

    #[test]
    fn button_reply_falls_back_to_title() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.B2",
            "type": "interactive",
            "interactive": {
                "type": "button_reply",
                "button_reply": {"id": "", "title": "Sim"}
            }
        })))
        .unwrap();

        assert_eq!(
            delivery.utterance,
            Utterance::ButtonReply {
                id: "Sim".to_string()
            }
        );
    }

    #[test]
    fn list_reply_resolves() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.L1",
            "type": "interactive",
            "interactive": {
                "type": "list_reply",
                "list_reply": {"id": "São Paulo", "title": "São Paulo"}
            }
        })))
        .unwrap();

        assert_eq!(
            delivery.utterance,
            Utterance::ListReply {
                id: "São Paulo".to_string()
            }
        );
    }

    #[test]
    fn audio_message_resolves_media_id() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.A1",
            "type": "audio",
            "audio": {"id": "media-789", "mime_type": "audio/ogg; codecs=opus"}
        })))
        .unwrap();

        assert_eq!(
            delivery.utterance,
            Utterance::Audio {
                media_id: "media-789".to_string()
            }
        );
    }

    #[test]
    fn unsupported_type_is_dropped() {
        let delivery = parse(wrap(serde_json::json!({
            "from": "5511999999999",
            "id": "wamid.I1",
            "type": "image",
            "image": {"id": "media-img"}
        })));
        assert!(delivery.is_none());
    }

    #[test]
    fn status_callback_without_messages_is_dropped() {
        let delivery = parse(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"id": "123", "changes": [{"field": "messages", "value": {
                "messaging_product": "whatsapp",
                "statuses": [{"id": "wamid.S1", "status": "delivered"}]
            }}]}]
        }));
        assert!(delivery.is_none());
    }

    #[test]
    fn empty_envelope_is_dropped() {
        assert!(parse(serde_json::json!({})).is_none());
        assert!(parse(serde_json::json!({"entry": []})).is_none());
    }

    #[test]
    fn missing_profile_name_is_tolerated() {
        let delivery = parse(serde_json::json!({
            "entry": [{"changes": [{"value": {
                "messages": [{
                    "from": "5511999999999",
                    "id": "wamid.N1",
                    "type": "text",
                    "text": {"body": "oi"}
                }]
            }}]}]
        }))
        .unwrap();
        assert_eq!(delivery.profile_name, None);
    }
}
