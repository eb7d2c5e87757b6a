// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived signed URLs for document upload and download.
//!
//! The panel never proxies file bytes. It hands the client a URL under the
//! configured bucket base carrying an expiry and an HMAC-SHA256 signature
//! over `{method}\n{object}\n{exp}`; the storage frontend re-derives the
//! same MAC to admit the request.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use coopmob_core::CoopmobError;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed URL stays valid.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Signs object paths under a public bucket base with a shared secret.
#[derive(Clone)]
pub struct UploadSigner {
    bucket_base: String,
    secret: String,
}

impl fmt::Debug for UploadSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSigner")
            .field("bucket_base", &self.bucket_base)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// A signed URL plus the request shape the client must use with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub method: String,
    pub expires_in: u64,
    pub object_name: String,
}

impl UploadSigner {
    pub fn new(bucket_base: impl Into<String>, secret: impl Into<String>) -> Self {
        let bucket_base: String = bucket_base.into();
        Self {
            bucket_base: bucket_base.trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// Sign `object` for `method`, valid for [`UPLOAD_URL_TTL`] from now.
    pub fn sign(&self, method: &str, object: &str) -> Result<SignedUrl, CoopmobError> {
        let exp = now_unix() + UPLOAD_URL_TTL.as_secs();
        self.sign_at(method, object, exp)
    }

    /// Sign with an explicit expiry timestamp (unix seconds).
    pub fn sign_at(&self, method: &str, object: &str, exp: u64) -> Result<SignedUrl, CoopmobError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CoopmobError::Internal(format!("upload signing key rejected: {e}")))?;
        mac.update(format!("{method}\n{object}\n{exp}").as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(SignedUrl {
            url: format!("{}/{object}?exp={exp}&sig={signature}", self.bucket_base),
            method: method.to_string(),
            expires_in: UPLOAD_URL_TTL.as_secs(),
            object_name: object.to_string(),
        })
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
