// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The CoopMob intake funnel: a deterministic conversation state machine.
//!
//! One inbound WhatsApp delivery goes through [`FunnelEngine::handle_delivery`],
//! which walks a fixed decision ladder over the persisted [`LeadContext`]:
//! intro script, city selection, requirements, the five-scenario
//! questionnaire, vacancy offer, closing. Everything outside the script is
//! either a global command, a menu re-send, or a hand-off to the
//! conversational agent.

pub mod command;
pub mod context;
pub mod disc;
pub mod engine;
pub mod recorder;
pub mod script;
pub mod stage;

pub use context::{ContextHandle, LeadContext, VagaSnapshot};
pub use engine::{Disposition, FunnelEngine, FunnelSettings};
pub use recorder::LeadRecorder;
pub use stage::Stage;
