//! # Checkpoints — Bounded Trail Growth
//!
//! A checkpoint records the hash and index of one entry so that earlier
//! entries can be pruned while the remainder stays verifiable: the
//! consumed checkpoint hash becomes the pruned trail's genesis. One
//! checkpoint is spent exactly once by pruning — this is not a sliding
//! window, and the pruned prefix's integrity must be attested elsewhere
//! (an archive, an anchor, a peer).
//!
//! Checkpointing is routine maintenance, so failures are structured
//! `Result`s, never panics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::trail::AuditTrail;
use crate::verify::{verify_audit_trail_integrity, FailurePhase, TrailVerification};

/// Why a checkpoint could not be created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("cannot checkpoint an empty audit trail")]
    EmptyTrail,

    #[error("checkpoint index {index} out of range [0, {last}]")]
    IndexOutOfRange { index: usize, last: usize },
}

/// A successfully created checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointUpdate {
    /// The trail with checkpoint fields set.
    pub trail: AuditTrail,
    pub checkpoint_index: usize,
    pub checkpoint_hash: String,
}

/// Create a checkpoint at `index` (default: the last entry).
///
/// The checkpoint records `entries[index].entry_hash`; entries at or
/// before the index become prunable once the checkpoint is consumed.
///
/// # Errors
///
/// [`CheckpointError::EmptyTrail`] or
/// [`CheckpointError::IndexOutOfRange`]. The input trail is not
/// modified; the updated trail is returned in the [`CheckpointUpdate`].
pub fn create_checkpoint(
    trail: &AuditTrail,
    index: Option<usize>,
) -> Result<CheckpointUpdate, CheckpointError> {
    if trail.entries.is_empty() {
        return Err(CheckpointError::EmptyTrail);
    }
    let last = trail.entries.len() - 1;
    let target = index.unwrap_or(last);
    if target > last {
        return Err(CheckpointError::IndexOutOfRange {
            index: target,
            last,
        });
    }

    let checkpoint_hash = trail.entries[target].entry_hash.clone();
    debug!(index = target, "audit trail checkpoint created");

    let mut updated = trail.clone();
    updated.checkpoint_hash = Some(checkpoint_hash.clone());
    updated.checkpoint_index = Some(target);
    Ok(CheckpointUpdate {
        trail: updated,
        checkpoint_index: target,
        checkpoint_hash,
    })
}

/// Verify that entries after the checkpoint chain correctly from the
/// checkpoint hash.
///
/// The first post-checkpoint entry's `previous_hash` must equal
/// `checkpoint_hash`; the rest of the suffix is verified with the
/// checkpoint hash as synthetic genesis. A trail without checkpoint
/// fields (or with nothing after the checkpoint) trivially verifies.
/// Reported indices are absolute positions in the full trail.
pub fn verify_checkpoint_continuity(trail: &AuditTrail) -> TrailVerification {
    let (Some(checkpoint_hash), Some(checkpoint_index)) =
        (trail.checkpoint_hash.as_deref(), trail.checkpoint_index)
    else {
        return TrailVerification::Valid;
    };

    let suffix_start = checkpoint_index + 1;
    if suffix_start >= trail.entries.len() {
        return TrailVerification::Valid;
    }

    let first = &trail.entries[suffix_start];
    if first.previous_hash != checkpoint_hash {
        return TrailVerification::Invalid {
            failure_phase: FailurePhase::Chain,
            failure_index: suffix_start,
            expected_hash: checkpoint_hash.to_owned(),
            actual_hash: first.previous_hash.clone(),
        };
    }

    let suffix = AuditTrail {
        entries: trail.entries[suffix_start..].to_vec(),
        hash_algorithm: trail.hash_algorithm,
        genesis_hash: checkpoint_hash.to_owned(),
        integrity_status: trail.integrity_status,
        checkpoint_hash: None,
        checkpoint_index: None,
    };
    match verify_audit_trail_integrity(&suffix) {
        TrailVerification::Valid => TrailVerification::Valid,
        TrailVerification::Invalid {
            failure_phase,
            failure_index,
            expected_hash,
            actual_hash,
        } => TrailVerification::Invalid {
            failure_phase,
            failure_index: failure_index + suffix_start,
            expected_hash,
            actual_hash,
        },
    }
}

/// Prune entries at and before the checkpoint, consuming it.
///
/// Returns a new trail containing only post-checkpoint entries, with the
/// checkpoint hash as its genesis and the checkpoint fields cleared. A
/// trail without a checkpoint is returned unchanged.
pub fn prune_before_checkpoint(trail: &AuditTrail) -> AuditTrail {
    let (Some(checkpoint_hash), Some(checkpoint_index)) =
        (trail.checkpoint_hash.clone(), trail.checkpoint_index)
    else {
        return trail.clone();
    };

    let kept: Vec<_> = trail
        .entries
        .iter()
        .skip(checkpoint_index + 1)
        .cloned()
        .collect();
    debug!(
        pruned = trail.entries.len() - kept.len(),
        kept = kept.len(),
        "audit trail pruned at checkpoint"
    );

    AuditTrail {
        entries: kept,
        hash_algorithm: trail.hash_algorithm,
        genesis_hash: checkpoint_hash,
        integrity_status: trail.integrity_status,
        checkpoint_hash: None,
        checkpoint_index: None,
    }
}
