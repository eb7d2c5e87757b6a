// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message payloads for the Graph API.
//!
//! Interactive titles are constrained by the platform: reply buttons carry at
//! most 20 characters, list rows at most 24. Ids are never truncated, so the
//! funnel can round-trip full values through a tapped option.

use coopmob_core::{MenuItem, UserId};
use serde::Serialize;

/// Character limit for reply button titles.
pub const BUTTON_TITLE_MAX: usize = 20;

/// Character limit for list row titles.
pub const ROW_TITLE_MAX: usize = 24;

#[derive(Debug, Serialize)]
pub struct TextMessage {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextContent,
}

#[derive(Debug, Serialize)]
pub struct TextContent {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct InteractiveMessage {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub interactive: Interactive,
}

#[derive(Debug, Serialize)]
pub struct Interactive {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub body: InteractiveBody,
    pub action: Action,
}

#[derive(Debug, Serialize)]
pub struct InteractiveBody {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ReplyButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
}

#[derive(Debug, Serialize)]
pub struct ReplyButton {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reply: ReplyTarget,
}

#[derive(Debug, Serialize)]
pub struct ReplyTarget {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct Section {
    pub rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct Row {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Clean a display title: strip surrounding whitespace, collapse newlines,
/// substitute a placeholder for empty labels, and cut at the platform limit.
///
/// Truncation counts characters, not bytes, so accented Portuguese labels
/// never split mid-codepoint.
pub fn sanitize_title(raw: &str, max_chars: usize, index: usize) -> String {
    let cleaned = raw.trim().replace('\n', " ");
    let title = if cleaned.is_empty() {
        format!("Opção {}", index + 1)
    } else {
        cleaned
    };
    title.chars().take(max_chars).collect()
}

pub fn text_message(to: &UserId, body: &str) -> TextMessage {
    TextMessage {
        messaging_product: "whatsapp",
        to: to.as_str().to_string(),
        kind: "text",
        text: TextContent {
            body: body.to_string(),
        },
    }
}

pub fn buttons_message(to: &UserId, body: &str, options: &[MenuItem]) -> InteractiveMessage {
    let buttons = options
        .iter()
        .enumerate()
        .map(|(i, item)| ReplyButton {
            kind: "reply",
            reply: ReplyTarget {
                id: item.id.clone(),
                title: sanitize_title(&item.title, BUTTON_TITLE_MAX, i),
            },
        })
        .collect();

    InteractiveMessage {
        messaging_product: "whatsapp",
        to: to.as_str().to_string(),
        kind: "interactive",
        interactive: Interactive {
            kind: "button",
            body: InteractiveBody {
                text: body.to_string(),
            },
            action: Action {
                buttons: Some(buttons),
                button: None,
                sections: None,
            },
        },
    }
}

pub fn list_message(
    to: &UserId,
    body: &str,
    options: &[MenuItem],
    button_label: &str,
) -> InteractiveMessage {
    let rows = options
        .iter()
        .enumerate()
        .map(|(i, item)| Row {
            id: item.id.clone(),
            title: sanitize_title(&item.title, ROW_TITLE_MAX, i),
            description: item.description.clone(),
        })
        .collect();

    InteractiveMessage {
        messaging_product: "whatsapp",
        to: to.as_str().to_string(),
        kind: "interactive",
        interactive: Interactive {
            kind: "list",
            body: InteractiveBody {
                text: body.to_string(),
            },
            action: Action {
                buttons: None,
                button: Some(button_label.to_string()),
                sections: Some(vec![Section { rows }]),
            },
        },
    }
}
