//! # Content Digest — `sha256:<hex>` Identifiers
//!
//! Defines `ContentDigest` and `DigestAlgorithm`, and the single digest
//! computation path [`sha256_digest()`].
//!
//! ## Security Invariant
//!
//! `sha256_digest()` accepts only `&CanonicalBytes`, never raw `&[u8]`.
//! Every digest in the system was therefore produced through the
//! canonicalization pipeline; there is no way to hash bytes that took a
//! different serialization route.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// The hash algorithm used to produce a content digest.
///
/// The protocol fixes `sha256` for all audit chains; the tag exists so
/// that digest strings stay self-describing across algorithm migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 — the only algorithm in the current protocol revision.
    Sha256,
}

impl DigestAlgorithm {
    /// The algorithm identifier string used in digest prefixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content digest with its algorithm tag.
///
/// Renders as `sha256:<64 lowercase hex chars>`, the wire format every
/// hash field in the audit trail uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a digest from raw bytes and algorithm. Prefer
    /// [`sha256_digest()`] for computing digests from data.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest value as lowercase hex, without the prefix.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a `sha256:<64-hex>` string back into a digest.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DigestFormat`] when the prefix, length, or
    /// hex alphabet is wrong. Uppercase hex is rejected; the wire format
    /// is lowercase only.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !Self::is_valid_str(s) {
            return Err(CoreError::DigestFormat(format!(
                "expected sha256:<64 lowercase hex chars>, got {s:?}"
            )));
        }
        let hex = &s["sha256:".len()..];
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            // Alphabet already validated; from_str_radix cannot fail here.
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| CoreError::DigestFormat(format!("non-UTF8 hex in {s:?}")))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| CoreError::DigestFormat(format!("invalid hex {pair:?} in {s:?}")))?;
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }

    /// Whether a string is a well-formed `sha256:<64 lowercase hex>` digest.
    pub fn is_valid_str(s: &str) -> bool {
        match s.strip_prefix("sha256:") {
            Some(hex) => {
                hex.len() == 64
                    && hex
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            }
            None => false,
        }
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// The signature enforces that only [`CanonicalBytes`] can be hashed.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

/// Compute a `sha256:<hex>`-prefixed digest string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_string()
}
