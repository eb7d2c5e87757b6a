// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port trait definitions for the funnel's external collaborators.
//!
//! The state machine only talks to the outside world through these traits,
//! which use `#[async_trait]` for dynamic dispatch compatibility. Tests swap
//! in in-memory fakes.

pub mod agent;
pub mod catalog;
pub mod channel;
pub mod sink;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use agent::AgentPort;
pub use catalog::CatalogPort;
pub use channel::ChannelPort;
pub use sink::LeadSink;
pub use store::ContextStore;
