// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter.
//!
//! Outbound sends and media downloads go through [`WhatsappClient`], which
//! implements [`coopmob_core::ChannelPort`]. Inbound webhook envelopes are
//! normalized by [`inbound::first_delivery`] into the channel-neutral
//! [`coopmob_core::InboundDelivery`] the funnel consumes.

pub mod client;
pub mod inbound;
pub mod payload;

pub use client::WhatsappClient;
pub use inbound::{WebhookEnvelope, first_delivery};
pub use payload::{BUTTON_TITLE_MAX, ROW_TITLE_MAX};
