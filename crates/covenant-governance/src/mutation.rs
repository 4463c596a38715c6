//! # Governance Mutations — The Authorization Boundary
//!
//! `GovernanceMutation` is the optimistic-concurrency envelope a caller
//! presents when mutating a governed resource; `evaluate_governance_
//! mutation` decides whether the envelope's actor may proceed. Policy
//! enforcement is opt-in per resource: no policy means open access, by
//! design and explicitly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use covenant_expr::EvaluationContext;

use crate::policy::{evaluate_access_policy, AccessPolicy, ActorContext, PolicyResult};

/// Optimistic-concurrency envelope for a proposed mutation.
///
/// `expected_version` is checked against the resource's current persisted
/// version by the resource owner's compare-and-swap; this crate only
/// carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceMutation {
    pub mutation_id: Uuid,
    pub expected_version: u64,
    /// ISO 8601 timestamp of the mutation attempt. Also freezes `now()`
    /// for predicate evaluation, so re-evaluating a historical decision
    /// reproduces it.
    pub mutated_at: String,
    pub actor_id: String,
}

/// Authorization decision for a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDecision {
    pub authorized: bool,
    pub actor_id: String,
    pub reason: String,
    /// The underlying policy evaluation, when a policy was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_result: Option<PolicyResult>,
}

/// Evaluate a mutation envelope against an optional access policy.
///
/// No policy configured means the mutation is authorized — policy
/// enforcement is opt-in per resource. With a policy, the actor context
/// is checked and any predicate expression sees the merged mutation +
/// actor + resource context.
pub fn evaluate_governance_mutation(
    mutation: &GovernanceMutation,
    policy: Option<&AccessPolicy>,
    actor: Option<&ActorContext>,
) -> MutationDecision {
    let Some(policy) = policy else {
        return MutationDecision {
            authorized: true,
            actor_id: mutation.actor_id.clone(),
            reason: "no access policy configured; mutation authorized by default".into(),
            policy_result: None,
        };
    };

    let default_actor = ActorContext::default();
    let actor = actor.unwrap_or(&default_actor);
    let merged = merged_context(mutation, actor);
    let eval_ctx = EvaluationContext::frozen(mutation.mutated_at.clone());

    let result = evaluate_access_policy(policy, actor, &merged, Some(&eval_ctx));
    debug!(
        actor_id = %mutation.actor_id,
        allowed = result.allowed,
        "governance mutation evaluated"
    );

    let reason = if result.allowed {
        format!("mutation authorized: {}", result.reason)
    } else {
        format!(
            "mutation denied for actor '{}': {}",
            mutation.actor_id, result.reason
        )
    };
    MutationDecision {
        authorized: result.allowed,
        actor_id: mutation.actor_id.clone(),
        reason,
        policy_result: Some(result),
    }
}

/// The document predicate expressions evaluate against: the mutation
/// envelope's fields, the actor's attributes, and the resource snapshot
/// under `resource`.
fn merged_context(mutation: &GovernanceMutation, actor: &ActorContext) -> Value {
    json!({
        "mutation_id": mutation.mutation_id,
        "expected_version": mutation.expected_version,
        "mutated_at": mutation.mutated_at,
        "actor_id": mutation.actor_id,
        "role": actor.role,
        "reputation_score": actor.reputation_score,
        "resource": actor.resource,
    })
}
