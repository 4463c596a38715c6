//! # Entry Hashing — Domain-Separated Content and Chain-Bound Hashes
//!
//! Two hash constructions, both deterministic and pure:
//!
//! - **Content hash**: `sha256(domain_tag || jcs(content_fields))` —
//!   identifies an entry's content within one hash domain, independent of
//!   input key order.
//! - **Chain-bound hash**: `sha256(content_hash ":" previous_hash)` —
//!   binds the content to its predecessor, producing the `entry_hash`
//!   stored on the chain.
//!
//! Byte-level framing: all strings UTF-8, colon delimiter (0x3A).
//! Identical inputs always yield identical output in any conforming
//! implementation.

use sha2::{Digest, Sha256};
use thiserror::Error;

use covenant_core::{CanonicalBytes, ContentDigest, DigestAlgorithm};

use crate::domain_tag::DomainTag;
use crate::trail::EntryContent;

/// Error in hash construction. These are programmer errors — a bad
/// domain tag or previous hash means the calling code is wired wrong —
/// so they fail fast rather than degrade.
#[derive(Error, Debug)]
pub enum ChainHashError {
    /// The domain tag fails the tag grammar. Domain separation is a
    /// security property; it is never silently skipped.
    #[error("invalid domain tag: {0}")]
    InvalidDomainTag(String),

    /// The previous hash is not `sha256:<64-hex>` (the genesis sentinel
    /// matches the format).
    #[error("invalid previous hash: {0}")]
    InvalidPreviousHash(String),

    /// The entry content could not be canonicalized (e.g. a float in the
    /// payload).
    #[error("canonicalization failed: {0}")]
    CanonicalizationFailed(String),
}

impl ChainHashError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDomainTag(_) => "INVALID_DOMAIN_TAG",
            Self::InvalidPreviousHash(_) => "INVALID_PREVIOUS_HASH",
            Self::CanonicalizationFailed(_) => "CANONICALIZATION_FAILED",
        }
    }
}

/// Compute the domain-separated content hash of an audit entry.
///
/// # Errors
///
/// `INVALID_DOMAIN_TAG` when the tag fails the grammar;
/// `CANONICALIZATION_FAILED` when the content cannot be canonicalized.
pub fn compute_audit_entry_hash(
    content: &EntryContent,
    domain_tag: &str,
) -> Result<String, ChainHashError> {
    let tag = DomainTag::parse(domain_tag)?;
    let canonical = CanonicalBytes::new(content)
        .map_err(|e| ChainHashError::CanonicalizationFailed(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(tag.as_str().as_bytes());
    hasher.update(canonical.as_bytes());
    Ok(digest_string(hasher))
}

/// Compute the chain-bound hash linking an entry to its predecessor.
///
/// # Errors
///
/// `INVALID_DOMAIN_TAG`, `INVALID_PREVIOUS_HASH`, or
/// `CANONICALIZATION_FAILED`, per the content-hash rules plus the
/// previous-hash format check.
pub fn compute_chain_bound_hash(
    content: &EntryContent,
    domain_tag: &str,
    previous_hash: &str,
) -> Result<String, ChainHashError> {
    if !ContentDigest::is_valid_str(previous_hash) {
        return Err(ChainHashError::InvalidPreviousHash(format!(
            "previous hash must match sha256:<64 hex> format, got {previous_hash:?}"
        )));
    }
    let content_hash = compute_audit_entry_hash(content, domain_tag)?;

    let mut hasher = Sha256::new();
    hasher.update(content_hash.as_bytes());
    hasher.update(b":");
    hasher.update(previous_hash.as_bytes());
    Ok(digest_string(hasher))
}

fn digest_string(hasher: Sha256) -> String {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentDigest::new(DigestAlgorithm::Sha256, bytes).to_string()
}
