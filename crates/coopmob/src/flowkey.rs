// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `coopmob flowkey` command implementation.
//!
//! Provisions the Ed25519 keypair the encrypted-flow endpoint registration
//! needs and prints where every artifact landed.

use std::path::Path;

use coopmob_core::CoopmobError;
use coopmob_flowkey::{SignInput, provision};

/// Runs the `coopmob flowkey` command.
pub fn run_flowkey(out: &Path, sign_input: SignInput) -> Result<(), CoopmobError> {
    let report = provision(out, sign_input)?;

    let verb = if report.reused_private {
        "reused"
    } else {
        "created"
    };
    println!("{verb} private key: {}", report.private_path.display());
    println!("wrote public key (hex): {}", report.public_hex_path.display());
    println!("wrote public key (raw): {}", report.public_raw_path.display());
    println!(
        "wrote signature over the {} artifact: {}",
        report.signed_input,
        report.signature_path.display()
    );
    println!(
        "wrote signature (base64): {}",
        report.signature_b64_path.display()
    );
    println!("public key hex: {}", report.public_hex);
    println!(
        "self-check: {}",
        if report.verified { "OK" } else { "FAILED" }
    );
    println!("next: register the public key and the base64 signature with the flow endpoint.");
    Ok(())
}
