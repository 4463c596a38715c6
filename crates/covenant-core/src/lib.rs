//! # covenant-core — Foundational Types for the Covenant Stack
//!
//! This crate is the bedrock of the Covenant Stack's hashing pipeline: the
//! canonical byte production and digest primitives that `covenant-audit`
//! builds its tamper-evident chains on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** ALL digest computation flows through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for digests.
//!    Ever. The inner bytes are private, so there is no second
//!    serialization path to diverge from.
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that every digest in the system was produced through the
//!    canonicalization pipeline.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces the Z suffix
//!    and seconds precision, so the same instant always canonicalizes to
//!    the same byte sequence.
//!
//! 4. **No floats in canonical form.** Independent re-implementations must
//!    reproduce digests byte-for-byte; float serialization is the one
//!    place JSON writers disagree, so floats are rejected at the door.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `covenant-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, CoreError};
pub use temporal::Timestamp;
