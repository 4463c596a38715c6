//! # Audit Trail — Append-Only Hash Chain
//!
//! `AuditEntry` and `AuditTrail`: the append-only event log attached to a
//! governed resource. Every entry's `entry_hash` is the chain-bound hash
//! of its content, its domain tag, and its predecessor's hash, so the
//! trail forms a tamper-evident linked list anchored at `genesis_hash`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::hash::{compute_chain_bound_hash, ChainHashError};

/// SHA-256 of the empty string — the genesis sentinel anchoring the first
/// entry of every new chain.
pub const AUDIT_TRAIL_GENESIS_HASH: &str =
    "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Hash function used for chain integrity. Fixed to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
}

/// Verification state recorded on a trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    /// Chain integrity confirmed by a verification pass.
    Verified,
    /// Chain not yet checked.
    #[default]
    Unverified,
    /// Discontinuity detected; entries after the break are suspect.
    Quarantined,
}

/// The hashable content fields of an audit entry, excluding hash-chain
/// metadata. This is the exact structure that is canonicalized and
/// domain-tag-hashed; optional fields that are absent are omitted from
/// the canonical form entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryContent {
    pub entry_id: Uuid,
    /// ISO 8601 timestamp, carried as an opaque string: re-rendering it
    /// would change the hashed bytes.
    pub timestamp: String,
    /// Dotted event type, e.g. `commons.transition.executed`.
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Event-specific data; shape varies by event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// A single entry in an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: Uuid,
    pub timestamp: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Chain-bound hash of this entry: content + domain tag +
    /// `previous_hash`.
    pub entry_hash: String,
    /// Hash of the preceding entry, or the genesis sentinel at index 0.
    pub previous_hash: String,
    /// The exact domain tag used when `entry_hash` was computed,
    /// persisted at write time so cross-version verification is
    /// unambiguous.
    pub hash_domain_tag: String,
}

impl AuditEntry {
    /// The content fields of this entry, as hashed.
    pub fn content(&self) -> EntryContent {
        EntryContent {
            entry_id: self.entry_id,
            timestamp: self.timestamp.clone(),
            event_type: self.event_type.clone(),
            actor_id: self.actor_id.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Append-only audit trail with hash-chain integrity and optional
/// checkpoint fields for bounded growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Ordered sequence of audit events. Append-only.
    pub entries: Vec<AuditEntry>,
    pub hash_algorithm: HashAlgorithm,
    /// Chain anchor. [`AUDIT_TRAIL_GENESIS_HASH`] for new trails; a
    /// consumed checkpoint hash after pruning.
    pub genesis_hash: String,
    pub integrity_status: IntegrityStatus,
    /// Hash of the most recent checkpoint entry, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_hash: Option<String>,
    /// Index of the checkpointed entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_index: Option<usize>,
}

impl AuditTrail {
    /// A fresh, empty trail anchored at the genesis sentinel.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            hash_algorithm: HashAlgorithm::Sha256,
            genesis_hash: AUDIT_TRAIL_GENESIS_HASH.to_owned(),
            integrity_status: IntegrityStatus::Verified,
            checkpoint_hash: None,
            checkpoint_index: None,
        }
    }

    /// The hash the next appended entry must chain from: the last entry's
    /// hash, or the genesis anchor for an empty trail.
    pub fn head_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.entry_hash.as_str())
            .unwrap_or(&self.genesis_hash)
    }

    /// Append externally-originated content to the chain, computing its
    /// chain-bound hash against the current head.
    ///
    /// # Errors
    ///
    /// Returns [`ChainHashError`] when the domain tag is invalid or the
    /// payload cannot be canonicalized. The trail is unchanged on error.
    pub fn append(
        &mut self,
        content: EntryContent,
        domain_tag: &str,
    ) -> Result<&AuditEntry, ChainHashError> {
        let previous_hash = self.head_hash().to_owned();
        let entry_hash = compute_chain_bound_hash(&content, domain_tag, &previous_hash)?;
        self.entries.push(AuditEntry {
            entry_id: content.entry_id,
            timestamp: content.timestamp,
            event_type: content.event_type,
            actor_id: content.actor_id,
            payload: content.payload,
            entry_hash,
            previous_hash,
            hash_domain_tag: domain_tag.to_owned(),
        });
        Ok(self.entries.last().expect("entry was just pushed"))
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
