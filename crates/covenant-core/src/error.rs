//! # Error Types — Shared Error Hierarchy
//!
//! Error types shared across the Covenant Stack, all derived with
//! `thiserror`. Crates further up the DAG define their own error enums and
//! convert from these where a canonicalization or temporal failure can
//! surface through their API.

use thiserror::Error;

/// Top-level error type for core primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A timestamp string did not satisfy the UTC-only grammar.
    #[error("temporal error: {0}")]
    Temporal(String),

    /// A digest string did not match the `sha256:<64-hex>` format.
    #[error("digest format error: {0}")]
    DigestFormat(String),
}

/// Error during canonical serialization.
///
/// Canonical bytes feed digest computation, so these errors are
/// security-relevant and always propagate; nothing in the stack hashes a
/// value that failed to canonicalize.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Non-integer float values are not permitted in canonical
    /// representations. Amounts must be integer strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
