// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ed25519 key material for the Flow endpoint registration.

use coopmob_core::CoopmobError;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Signing key held in memory while provisioning runs.
///
/// The private half lives on disk as lowercase hex; the public half is
/// what gets pasted into the WhatsApp Flow Builder.
pub struct FlowKeypair {
    signing_key: SigningKey,
}

impl FlowKeypair {
    /// Draw a fresh random key from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild the key from its 32 raw private bytes.
    pub fn from_bytes(private_bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(private_bytes),
        }
    }

    /// Rebuild the key from the hex form that [`provision`] writes.
    ///
    /// [`provision`]: crate::provision
    pub fn from_hex(private_hex: &str) -> Result<Self, CoopmobError> {
        let decoded = hex::decode(private_hex)
            .map_err(|e| CoopmobError::Config(format!("flow private key is not hex: {e}")))?;
        match <[u8; 32]>::try_from(decoded.as_slice()) {
            Ok(bytes) => Ok(Self::from_bytes(&bytes)),
            Err(_) => Err(CoopmobError::Config(format!(
                "flow private key holds {} bytes, expected 32",
                decoded.len()
            ))),
        }
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn private_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// Lowercase hex of the private key, the on-disk storage form.
    pub fn private_hex(&self) -> String {
        hex::encode(self.private_bytes())
    }

    /// Lowercase hex of the public key, the form the Flow Builder accepts.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_bytes())
    }

    /// Sign `message` with the private key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Strict-mode verification against the public key. On top of the
    /// plain signature check, strict mode rejects weak public keys.
    pub fn verify_strict(&self, message: &[u8], signature: &Signature) -> Result<(), CoopmobError> {
        self.verifying_key()
            .verify_strict(message, signature)
            .map_err(|e| CoopmobError::Internal(format!("flow signature did not verify: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_material_has_expected_sizes() {
        let kp = FlowKeypair::generate();
        assert_eq!(kp.private_bytes().len(), 32);
        assert_eq!(kp.public_bytes().len(), 32);
        assert_eq!(kp.private_hex().len(), 64);
        assert_eq!(kp.public_hex().len(), 64);
    }

    #[test]
    fn hex_roundtrip_preserves_the_key() {
        let kp1 = FlowKeypair::generate();
        let kp2 = FlowKeypair::from_hex(&kp1.private_hex()).unwrap();
        assert_eq!(kp1.public_hex(), kp2.public_hex());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(FlowKeypair::from_hex("zz").is_err());
        // valid hex, wrong length
        assert!(FlowKeypair::from_hex("abcd").is_err());
    }

    #[test]
    fn signature_spans_64_bytes() {
        let kp = FlowKeypair::generate();
        assert_eq!(kp.sign(b"flow registration").to_bytes().len(), 64);
    }

    #[test]
    fn tampering_breaks_verification() {
        let kp = FlowKeypair::generate();
        let sig = kp.sign(b"payload as signed");
        assert!(kp.verify_strict(b"payload as signed", &sig).is_ok());
        assert!(kp.verify_strict(b"payload was altered", &sig).is_err());
    }

    #[test]
    fn two_generated_keys_differ() {
        assert_ne!(
            FlowKeypair::generate().public_hex(),
            FlowKeypair::generate().public_hex()
        );
    }
}
