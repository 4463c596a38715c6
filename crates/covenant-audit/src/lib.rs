//! # covenant-audit — Tamper-Evident Audit Trails
//!
//! Hash-chained audit trails for governed resources. Each entry's hash
//! binds its content, its domain tag, and its predecessor's hash, so a
//! trail is a tamper-evident linked list: edit any entry's payload, or
//! re-point any link, and verification reports the first broken index.
//!
//! ## Division of Labor
//!
//! This crate never creates entry content — events originate with the
//! resource owner. It hashes what it is given, links entries, verifies
//! chains, and manages checkpoints for bounded storage growth.
//!
//! ## Error Discipline
//!
//! Domain-separation and chain-format mistakes ([`ChainHashError`]) are
//! programmer errors and fail fast. Verification of untrusted trails
//! never fails fast: it returns a structured [`TrailVerification`] the
//! caller branches on. Checkpoint maintenance returns structured
//! `Result`s because running against an empty or shrunken trail is
//! routine, not exceptional.

pub mod checkpoint;
pub mod domain_tag;
pub mod hash;
pub mod trail;
pub mod verify;

pub use checkpoint::{
    create_checkpoint, prune_before_checkpoint, verify_checkpoint_continuity, CheckpointError,
    CheckpointUpdate,
};
pub use domain_tag::{build_domain_tag, DomainTag};
pub use hash::{compute_audit_entry_hash, compute_chain_bound_hash, ChainHashError};
pub use trail::{
    AuditEntry, AuditTrail, EntryContent, HashAlgorithm, IntegrityStatus,
    AUDIT_TRAIL_GENESIS_HASH,
};
pub use verify::{verify_audit_trail_integrity, FailurePhase, TrailVerification};
