// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply post-processing helpers.
//!
//! The model is asked to answer structured JSON when it offers choices, but
//! it often wraps the object in prose or answers plain text. These helpers
//! recover the structure without ever failing: worst case the raw text is
//! passed through as-is.

use std::sync::LazyLock;

use coopmob_core::AgentReply;
use regex::Regex;

/// "…escolha: a, b ou c." with the enumeration closed by sentence
/// punctuation. Tried first so trailing prose after the list is not
/// swallowed into the last option.
static CLAUSE_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*([^.!?]+)[.!?]").unwrap());

/// "…escolha: a, b, c" running to the end of the reply.
static TRAILING_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*([^\n\r]+)$").unwrap());

/// Parse the first JSON object embedded in `text`.
///
/// Tries the whole trimmed text first, then the region between the first
/// `{` and the last `}`.
pub fn parse_first_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Interpret raw model output as an [`AgentReply`].
///
/// A JSON object carrying `content` and/or `options` wins; anything else is
/// passed through as plain content. An empty options array counts as none.
pub fn reply_from_text(text: &str) -> AgentReply {
    if let Some(value) = parse_first_json(text) {
        if let Some(object) = value.as_object() {
            if object.contains_key("content") || object.contains_key("options") {
                let content = object
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let options = object
                    .get("options")
                    .and_then(|v| v.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect::<Vec<_>>()
                    })
                    .filter(|options| !options.is_empty());
                return AgentReply { content, options };
            }
        }
    }

    AgentReply {
        content: text.to_string(),
        options: None,
    }
}

/// Heuristic option extraction from prose.
///
/// Looks for a colon-introduced enumeration ("Os turnos são: manhã, tarde
/// ou noite."), splits on commas after normalizing " ou "/" e " into
/// separators, and keeps deduplicated parts with at least two characters
/// and no digits. Callers only use the result when it yields two or more
/// options.
pub fn extract_options_from_text(text: &str) -> Vec<String> {
    let captures = CLAUSE_LIST
        .captures(text)
        .or_else(|| TRAILING_LIST.captures(text));
    let Some(region) = captures.and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let normalized = region.as_str().replace(" ou ", ", ").replace(" e ", ", ");

    let mut seen = std::collections::HashSet::new();
    let mut options = Vec::new();
    for part in normalized.split(',') {
        let part = part.trim();
        if part.chars().count() < 2 || part.chars().any(|c| c.is_numeric()) {
            continue;
        }
        if seen.insert(part.to_string()) {
            options.push(part.to_string());
        }
    }
    options
}
