//! # covenant-governance — Mutation Authorization
//!
//! Authorizes proposed mutations to governed resources against access
//! policies. The decision is pure: policy + mutation envelope + actor
//! context in, structured decision out. When a policy carries a predicate
//! expression, evaluation delegates to `covenant-expr` against a merged
//! mutation + actor + resource context with the clock frozen at the
//! mutation's `mutated_at` — re-evaluating a historical decision gives
//! the same answer.
//!
//! Optimistic concurrency (`expected_version` against the current
//! persisted version) is the resource owner's contract to enforce via
//! compare-and-swap; this crate carries and authorizes the envelope, it
//! never performs the CAS.

pub mod error;
pub mod mutation;
pub mod policy;

pub use error::{GovernanceError, GovernanceErrorBase};
pub use mutation::{evaluate_governance_mutation, GovernanceMutation, MutationDecision};
pub use policy::{
    evaluate_access_policy, AccessPolicy, ActorContext, PolicyCombinator, PolicyKind, PolicyResult,
};
