// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the CoopMob intake funnel.
//!
//! This crate provides the foundational port traits, error type, and common
//! types used throughout the CoopMob workspace. The funnel state machine
//! depends only on traits defined here; concrete adapters live in sibling
//! crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CoopmobError;
pub use types::{
    AgentReply, DeliveryId, InboundDelivery, LeadRecord, Listing, MediaPayload, MenuItem,
    MenuKind, MenuSnapshot, UserId, Utterance,
};

// Re-export all port traits at crate root.
pub use traits::{AgentPort, CatalogPort, ChannelPort, ContextStore, LeadSink};
