//! # Evaluation Context — Deterministic Replay
//!
//! Time-dependent constraints (`now()`) cannot be replayed faithfully
//! against the live clock: evaluating the same expression tomorrow gives a
//! different answer. `EvaluationContext` carries an optional frozen clock
//! value that `now()` returns instead, which is what makes audit replay
//! and governance re-evaluation reproducible.
//!
//! The context is an explicit parameter threaded through every recursive
//! sub-evaluation, including `.every` predicates — never a global.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Optional evaluation context for constraint evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// ISO 8601 timestamp substituted for the live clock inside `now()`.
    ///
    /// The value is returned verbatim (not re-rendered), so the bytes a
    /// replayed constraint sees are exactly the bytes recorded. An
    /// invalid timestamp is ignored and `now()` falls through to the
    /// live clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_timestamp: Option<String>,
}

impl EvaluationContext {
    /// Context with a frozen clock.
    pub fn frozen(timestamp: impl Into<String>) -> Self {
        Self {
            evaluation_timestamp: Some(timestamp.into()),
        }
    }

    /// The frozen timestamp, if present and valid RFC 3339.
    pub fn valid_frozen_timestamp(&self) -> Option<&str> {
        let ts = self.evaluation_timestamp.as_deref()?;
        DateTime::parse_from_rfc3339(ts).ok()?;
        Some(ts)
    }
}
