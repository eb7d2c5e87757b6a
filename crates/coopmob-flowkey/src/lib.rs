// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ed25519 key provisioning for WhatsApp Flow public-key registration.
//!
//! Flow endpoints require a registered public key. This crate writes the
//! whole registration bundle into an output directory: the keypair, the
//! public key in hex and raw form, and a self-signature over the chosen
//! public artifact (raw plus base64), verified strictly before reporting.

pub mod artifacts;
pub mod keypair;

pub use artifacts::{FlowkeyReport, SignInput, provision};
pub use keypair::FlowKeypair;
