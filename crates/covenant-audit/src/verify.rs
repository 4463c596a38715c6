//! # Chain Verification — End-to-End Integrity Walk
//!
//! Verifies a whole trail in order, checking both link structure and
//! hash recomputation. Verification routinely runs against untrusted or
//! historical data, so it never fails fast: the outcome is a structured
//! value the caller branches on, and an empty trail is trivially valid.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hash::compute_chain_bound_hash;
use crate::trail::AuditTrail;

/// Which check an entry failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePhase {
    /// `previous_hash` does not point at the predecessor (or genesis).
    Chain,
    /// Recomputing the chain-bound hash from the entry's own content
    /// does not reproduce `entry_hash` — the content was edited after
    /// hashing, or the hash was forged.
    Content,
}

/// Outcome of verifying a trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailVerification {
    Valid,
    Invalid {
        failure_phase: FailurePhase,
        /// Absolute index of the first failing entry.
        failure_index: usize,
        expected_hash: String,
        actual_hash: String,
    },
}

impl TrailVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, TrailVerification::Valid)
    }
}

impl Serialize for TrailVerification {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            TrailVerification::Valid => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("valid", &true)?;
                map.end()
            }
            TrailVerification::Invalid {
                failure_phase,
                failure_index,
                expected_hash,
                actual_hash,
            } => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("failure_phase", failure_phase)?;
                map.serialize_entry("failure_index", failure_index)?;
                map.serialize_entry("expected_hash", expected_hash)?;
                map.serialize_entry("actual_hash", actual_hash)?;
                map.end()
            }
        }
    }
}

/// Verify hash-chain integrity of an entire trail.
///
/// For each entry in order:
///
/// 1. **Chain phase**: `previous_hash` must equal the prior entry's
///    `entry_hash` (the trail's `genesis_hash` at index 0).
/// 2. **Content phase**: recomputing the chain-bound hash from the
///    entry's content, its persisted `hash_domain_tag`, and its declared
///    `previous_hash` must reproduce `entry_hash`. This catches
///    forged-but-consistent edits where the links still line up.
///
/// The first mismatch is reported with both hashes. An entry whose hash
/// cannot be recomputed at all (invalid persisted tag, uncanonicalizable
/// payload) is a content failure at that index with an empty
/// `actual_hash`.
pub fn verify_audit_trail_integrity(trail: &AuditTrail) -> TrailVerification {
    for (i, entry) in trail.entries.iter().enumerate() {
        let expected_previous = if i == 0 {
            trail.genesis_hash.as_str()
        } else {
            trail.entries[i - 1].entry_hash.as_str()
        };

        if entry.previous_hash != expected_previous {
            warn!(
                index = i,
                phase = "chain",
                "audit trail linkage mismatch"
            );
            return TrailVerification::Invalid {
                failure_phase: FailurePhase::Chain,
                failure_index: i,
                expected_hash: expected_previous.to_owned(),
                actual_hash: entry.previous_hash.clone(),
            };
        }

        let recomputed = compute_chain_bound_hash(
            &entry.content(),
            &entry.hash_domain_tag,
            &entry.previous_hash,
        );
        match recomputed {
            Ok(hash) if hash == entry.entry_hash => {}
            Ok(hash) => {
                warn!(
                    index = i,
                    phase = "content",
                    "audit trail content hash mismatch"
                );
                return TrailVerification::Invalid {
                    failure_phase: FailurePhase::Content,
                    failure_index: i,
                    expected_hash: entry.entry_hash.clone(),
                    actual_hash: hash,
                };
            }
            Err(err) => {
                warn!(
                    index = i,
                    phase = "content",
                    error = %err,
                    "audit trail entry hash not recomputable"
                );
                return TrailVerification::Invalid {
                    failure_phase: FailurePhase::Content,
                    failure_index: i,
                    expected_hash: entry.entry_hash.clone(),
                    actual_hash: String::new(),
                };
            }
        }
    }
    TrailVerification::Valid
}
