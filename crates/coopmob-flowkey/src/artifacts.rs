// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk provisioning of the Flow key artifacts.
//!
//! One run produces everything the Flow Builder registration asks for:
//! the keypair itself (private key reused across runs when already
//! present), the public key in hex and raw form, and a self-signature
//! over the chosen public artifact in raw and base64 form.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use coopmob_core::CoopmobError;
use ed25519_dalek::Signature;
use tracing::info;

use crate::keypair::FlowKeypair;

/// Which public-key artifact the self-signature covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInput {
    /// Sign the raw 32-byte public key file.
    Raw,
    /// Sign the hex-encoded public key file.
    Hex,
}

impl fmt::Display for SignInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignInput::Raw => write!(f, "raw"),
            SignInput::Hex => write!(f, "hex"),
        }
    }
}

impl FromStr for SignInput {
    type Err = CoopmobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(SignInput::Raw),
            "hex" => Ok(SignInput::Hex),
            other => Err(CoopmobError::Config(format!(
                "sign input must be 'raw' or 'hex', got '{other}'"
            ))),
        }
    }
}

/// What one provisioning run produced and where.
#[derive(Debug)]
pub struct FlowkeyReport {
    pub reused_private: bool,
    pub private_path: PathBuf,
    pub public_hex_path: PathBuf,
    pub public_raw_path: PathBuf,
    pub signature_path: PathBuf,
    pub signature_b64_path: PathBuf,
    pub signed_input: SignInput,
    pub verified: bool,
    pub public_hex: String,
}

/// Generate or reuse the keypair under `out_dir`, write all artifacts, sign
/// the chosen public artifact, and verify the signature strictly.
///
/// The private key is reused when `flow_private.key` already exists; the
/// public artifacts and signature are rewritten on every run so they always
/// match the private key.
pub fn provision(out_dir: &Path, sign_input: SignInput) -> Result<FlowkeyReport, CoopmobError> {
    fs::create_dir_all(out_dir).map_err(|e| io_err(out_dir, &e))?;

    let private_path = out_dir.join("flow_private.key");
    let public_hex_path = out_dir.join("flow_public.key");
    let public_raw_path = out_dir.join("flow_public.raw");
    let signature_path = out_dir.join("flow_public.sig");
    let signature_b64_path = out_dir.join("flow_public.sig.b64");

    let (keypair, reused_private) = match fs::read_to_string(&private_path) {
        Ok(content) => (FlowKeypair::from_hex(content.trim())?, true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let keypair = FlowKeypair::generate();
            fs::write(&private_path, format!("{}\n", keypair.private_hex()))
                .map_err(|e| io_err(&private_path, &e))?;
            (keypair, false)
        }
        Err(e) => return Err(io_err(&private_path, &e)),
    };

    fs::write(&public_hex_path, format!("{}\n", keypair.public_hex()))
        .map_err(|e| io_err(&public_hex_path, &e))?;
    fs::write(&public_raw_path, keypair.public_bytes())
        .map_err(|e| io_err(&public_raw_path, &e))?;

    let sign_path = match sign_input {
        SignInput::Raw => &public_raw_path,
        SignInput::Hex => &public_hex_path,
    };
    let message = fs::read(sign_path).map_err(|e| io_err(sign_path, &e))?;
    let signature = keypair.sign(&message);
    fs::write(&signature_path, signature.to_bytes()).map_err(|e| io_err(&signature_path, &e))?;
    fs::write(
        &signature_b64_path,
        format!("{}\n", STANDARD.encode(signature.to_bytes())),
    )
    .map_err(|e| io_err(&signature_b64_path, &e))?;

    let verified = verify_artifacts(&keypair, sign_path, &signature_path)?;
    info!(
        out_dir = %out_dir.display(),
        reused = reused_private,
        signed = %sign_input,
        verified,
        "flow key artifacts written"
    );

    Ok(FlowkeyReport {
        reused_private,
        private_path,
        public_hex_path,
        public_raw_path,
        signature_path,
        signature_b64_path,
        signed_input: sign_input,
        verified,
        public_hex: keypair.public_hex(),
    })
}

/// Re-read the signed artifact and signature from disk and verify strictly.
fn verify_artifacts(
    keypair: &FlowKeypair,
    signed_path: &Path,
    signature_path: &Path,
) -> Result<bool, CoopmobError> {
    let message = fs::read(signed_path).map_err(|e| io_err(signed_path, &e))?;
    let raw = fs::read(signature_path).map_err(|e| io_err(signature_path, &e))?;
    let raw: [u8; 64] = match raw.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let signature = Signature::from_bytes(&raw);
    Ok(keypair.verify_strict(&message, &signature).is_ok())
}

fn io_err(path: &Path, e: &io::Error) -> CoopmobError {
    CoopmobError::Internal(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn provision_writes_all_artifacts() {
        let dir = tempdir().unwrap();
        let report = provision(dir.path(), SignInput::Raw).unwrap();

        assert!(!report.reused_private);
        assert!(report.verified);
        assert_eq!(report.public_hex.len(), 64);

        let private = fs::read_to_string(&report.private_path).unwrap();
        assert_eq!(private.trim().len(), 64);
        let public_hex = fs::read_to_string(&report.public_hex_path).unwrap();
        assert_eq!(public_hex.trim(), report.public_hex);
        assert_eq!(fs::read(&report.public_raw_path).unwrap().len(), 32);
        assert_eq!(fs::read(&report.signature_path).unwrap().len(), 64);

        let b64 = fs::read_to_string(&report.signature_b64_path).unwrap();
        let decoded = STANDARD.decode(b64.trim()).unwrap();
        assert_eq!(decoded, fs::read(&report.signature_path).unwrap());
    }

    #[test]
    fn second_run_reuses_the_private_key() {
        let dir = tempdir().unwrap();
        let first = provision(dir.path(), SignInput::Raw).unwrap();
        let second = provision(dir.path(), SignInput::Raw).unwrap();

        assert!(!first.reused_private);
        assert!(second.reused_private);
        assert_eq!(first.public_hex, second.public_hex);
        assert!(second.verified);
    }

    #[test]
    fn hex_input_signs_the_hex_artifact() {
        let dir = tempdir().unwrap();
        let report = provision(dir.path(), SignInput::Hex).unwrap();
        assert!(report.verified);

        // The signature must cover the hex file bytes, not the raw key.
        let keypair =
            FlowKeypair::from_hex(fs::read_to_string(&report.private_path).unwrap().trim())
                .unwrap();
        let sig_bytes: [u8; 64] = fs::read(&report.signature_path)
            .unwrap()
            .try_into()
            .unwrap();
        let signature = Signature::from_bytes(&sig_bytes);
        let hex_message = fs::read(&report.public_hex_path).unwrap();
        assert!(keypair.verify_strict(&hex_message, &signature).is_ok());
        let raw_message = fs::read(&report.public_raw_path).unwrap();
        assert!(keypair.verify_strict(&raw_message, &signature).is_err());
    }

    #[test]
    fn corrupted_private_key_fails_loudly() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flow_private.key"), "not hex at all\n").unwrap();
        assert!(provision(dir.path(), SignInput::Raw).is_err());
    }

    #[test]
    fn sign_input_parses_both_forms() {
        assert_eq!("raw".parse::<SignInput>().unwrap(), SignInput::Raw);
        assert_eq!("hex".parse::<SignInput>().unwrap(), SignInput::Hex);
        assert!("pem".parse::<SignInput>().is_err());
        assert_eq!(SignInput::Raw.to_string(), "raw");
    }
}
