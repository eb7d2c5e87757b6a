// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini-backed conversational agent for the intake funnel.
//!
//! The deterministic funnel owns the conversation; this crate handles the
//! free-form parts: answering off-script questions through the Kelly persona
//! and transcribing audio messages. Replies are normalized into
//! [`coopmob_core::AgentReply`] so the caller can render menus uniformly.

pub mod client;
pub mod extract;

pub use client::GeminiAgent;
pub use extract::{extract_options_from_text, parse_first_json, reply_from_text};
