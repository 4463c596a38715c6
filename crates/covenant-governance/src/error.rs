//! # Governance Error Taxonomy — Structured Failure Vocabulary
//!
//! The discriminated error vocabulary governed-resource owners record and
//! exchange. These are data, not exceptions: a resource owner carries
//! them in responses and audit payloads, and callers branch on the
//! `type` discriminant. Only the optimistic-concurrency version mismatch
//! is retryable; every other variant reflects a state that retrying
//! cannot fix.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields shared by every governance error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceErrorBase {
    pub error_code: String,
    pub message: String,
    pub affected_fields: Vec<String>,
    /// The audit entry recording this error, when one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_entry_id: Option<Uuid>,
    pub timestamp: String,
}

/// Discriminated union of governance errors. Discriminant field: `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GovernanceError {
    /// A conservation invariant was violated.
    #[serde(rename = "INVARIANT_VIOLATION")]
    InvariantViolation {
        invariant_id: String,
        expression: String,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },

    /// A state machine transition is not allowed from the current state.
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition {
        from_state: String,
        to_state: String,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },

    /// A transition guard expression evaluated to false.
    #[serde(rename = "GUARD_FAILURE")]
    GuardFailure {
        guard_expression: String,
        retryable: bool,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },

    /// A constraint expression failed to evaluate (parse error).
    #[serde(rename = "EVALUATION_ERROR")]
    EvaluationError {
        expression: String,
        eval_error: String,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },

    /// A hash chain discontinuity was detected in the audit trail.
    #[serde(rename = "HASH_DISCONTINUITY")]
    HashDiscontinuity {
        entry_index: usize,
        expected_hash: String,
        actual_hash: String,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },

    /// Optimistic concurrency (compare-and-swap) version mismatch.
    #[serde(rename = "PARTIAL_APPLICATION")]
    PartialApplication {
        expected_version: u64,
        actual_version: u64,
        #[serde(flatten)]
        base: GovernanceErrorBase,
    },
}

impl GovernanceError {
    /// Whether retrying the operation can succeed.
    pub fn retryable(&self) -> bool {
        match self {
            Self::PartialApplication { .. } => true,
            Self::GuardFailure { retryable, .. } => *retryable,
            Self::InvariantViolation { .. }
            | Self::InvalidTransition { .. }
            | Self::EvaluationError { .. }
            | Self::HashDiscontinuity { .. } => false,
        }
    }

    /// The shared base fields.
    pub fn base(&self) -> &GovernanceErrorBase {
        match self {
            Self::InvariantViolation { base, .. }
            | Self::InvalidTransition { base, .. }
            | Self::GuardFailure { base, .. }
            | Self::EvaluationError { base, .. }
            | Self::HashDiscontinuity { base, .. }
            | Self::PartialApplication { base, .. } => base,
        }
    }
}
