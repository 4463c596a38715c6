//! # Access Policies — Polymorphic Authorization Rules
//!
//! The closed set of policy kinds a governed resource can attach to its
//! mutation boundary, and the evaluator that decides whether an actor
//! passes. Compound policies combine sub-policies with and/or,
//! short-circuiting; any policy may additionally carry a constraint
//! expression that is ANDed into the decision.
//!
//! A predicate that fails to parse denies: authorization must not crash,
//! and a malformed predicate must never widen access.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use covenant_expr::{evaluate_constraint, EvaluationContext};

/// An access policy attached to a governed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(flatten)]
    pub kind: PolicyKind,
    /// Optional constraint expression evaluated against the merged
    /// mutation + actor + resource context. ANDed into the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
}

impl AccessPolicy {
    /// Policy of the given kind with no predicate.
    pub fn of(kind: PolicyKind) -> Self {
        Self {
            kind,
            predicate: None,
        }
    }
}

/// The policy variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
    /// Access granted to specific roles.
    RoleBased { roles: Vec<String> },
    /// No access for anyone.
    None,
    /// Read-only access. Mutations are writes by definition, so this
    /// always denies here.
    ReadOnly,
    /// Access gated on a minimum reputation score.
    ReputationGated { min_reputation_score: f64 },
    /// Combination of sub-policies.
    Compound {
        combinator: PolicyCombinator,
        policies: Vec<AccessPolicy>,
    },
}

/// How a compound policy combines its sub-policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyCombinator {
    And,
    Or,
}

/// The acting identity a policy is evaluated against, supplied by the
/// authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_score: Option<f64>,
    /// Snapshot of the governed resource, made visible to predicate
    /// expressions under the `resource` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

/// Outcome of evaluating one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub allowed: bool,
    pub reason: String,
}

impl PolicyResult {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Evaluate an access policy for a write against the actor context.
///
/// `predicate_context` is the merged mutation + actor + resource
/// document predicate expressions see; `eval_ctx` freezes `now()` for
/// replayable decisions.
pub fn evaluate_access_policy(
    policy: &AccessPolicy,
    actor: &ActorContext,
    predicate_context: &Value,
    eval_ctx: Option<&EvaluationContext>,
) -> PolicyResult {
    let kind_result = evaluate_kind(&policy.kind, actor, predicate_context, eval_ctx);
    if !kind_result.allowed {
        return kind_result;
    }

    let Some(predicate) = &policy.predicate else {
        return kind_result;
    };
    match evaluate_constraint(predicate_context, predicate, eval_ctx) {
        Ok(true) => PolicyResult::allow(format!("{}; predicate satisfied", kind_result.reason)),
        Ok(false) => PolicyResult::deny(format!("predicate not satisfied: {predicate}")),
        Err(err) => {
            debug!(error = %err, "policy predicate failed to parse; denying");
            PolicyResult::deny(format!("predicate failed to parse ({err}); denying"))
        }
    }
}

fn evaluate_kind(
    kind: &PolicyKind,
    actor: &ActorContext,
    predicate_context: &Value,
    eval_ctx: Option<&EvaluationContext>,
) -> PolicyResult {
    match kind {
        PolicyKind::None => PolicyResult::deny("policy type 'none' denies all access"),
        PolicyKind::ReadOnly => {
            PolicyResult::deny("read-only policy cannot authorize a write action")
        }
        PolicyKind::RoleBased { roles } => match &actor.role {
            Some(role) if roles.contains(role) => {
                PolicyResult::allow(format!("role '{role}' is granted access"))
            }
            Some(role) => PolicyResult::deny(format!("role '{role}' is not in the granted roles")),
            None => PolicyResult::deny("no role provided for role_based policy"),
        },
        PolicyKind::ReputationGated {
            min_reputation_score,
        } => match actor.reputation_score {
            Some(score) if score >= *min_reputation_score => PolicyResult::allow(format!(
                "reputation score {score} meets minimum {min_reputation_score}"
            )),
            Some(score) => PolicyResult::deny(format!(
                "reputation score {score} below minimum {min_reputation_score}"
            )),
            None => PolicyResult::deny("no reputation score provided for reputation_gated policy"),
        },
        PolicyKind::Compound {
            combinator,
            policies,
        } => evaluate_compound(*combinator, policies, actor, predicate_context, eval_ctx),
    }
}

fn evaluate_compound(
    combinator: PolicyCombinator,
    policies: &[AccessPolicy],
    actor: &ActorContext,
    predicate_context: &Value,
    eval_ctx: Option<&EvaluationContext>,
) -> PolicyResult {
    match combinator {
        PolicyCombinator::And => {
            for policy in policies {
                let result = evaluate_access_policy(policy, actor, predicate_context, eval_ctx);
                if !result.allowed {
                    return PolicyResult::deny(format!("compound(and): {}", result.reason));
                }
            }
            PolicyResult::allow("compound(and): all sub-policies allowed")
        }
        PolicyCombinator::Or => {
            for policy in policies {
                let result = evaluate_access_policy(policy, actor, predicate_context, eval_ctx);
                if result.allowed {
                    return PolicyResult::allow(format!("compound(or): {}", result.reason));
                }
            }
            PolicyResult::deny("compound(or): no sub-policy allowed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actor(role: Option<&str>, score: Option<f64>) -> ActorContext {
        ActorContext {
            role: role.map(str::to_owned),
            reputation_score: score,
            resource: None,
        }
    }

    fn eval(policy: &AccessPolicy, actor: &ActorContext) -> PolicyResult {
        evaluate_access_policy(policy, actor, &json!({}), None)
    }

    #[test]
    fn none_denies_everyone() {
        let policy = AccessPolicy::of(PolicyKind::None);
        let result = eval(&policy, &actor(Some("admin"), Some(1.0)));
        assert!(!result.allowed);
        assert!(result.reason.contains("none"));
    }

    #[test]
    fn read_only_denies_writes() {
        let policy = AccessPolicy::of(PolicyKind::ReadOnly);
        let result = eval(&policy, &actor(Some("auditor"), None));
        assert!(!result.allowed);
        assert!(result.reason.contains("write"));
    }

    #[test]
    fn role_based_grants_matching_roles() {
        let policy = AccessPolicy::of(PolicyKind::RoleBased {
            roles: vec!["auditor".into(), "admin".into()],
        });
        assert!(eval(&policy, &actor(Some("auditor"), None)).allowed);
        assert!(eval(&policy, &actor(Some("admin"), None)).allowed);

        let denied = eval(&policy, &actor(Some("viewer"), None));
        assert!(!denied.allowed);
        assert!(denied.reason.contains("viewer"));

        let no_role = eval(&policy, &actor(None, None));
        assert!(!no_role.allowed);
        assert!(no_role.reason.contains("no role provided"));
    }

    #[test]
    fn reputation_gate_is_inclusive_at_the_threshold() {
        let policy = AccessPolicy::of(PolicyKind::ReputationGated {
            min_reputation_score: 0.7,
        });
        assert!(eval(&policy, &actor(None, Some(0.7))).allowed);
        assert!(eval(&policy, &actor(None, Some(0.9))).allowed);
        assert!(!eval(&policy, &actor(None, Some(0.69))).allowed);
        assert!(!eval(&policy, &actor(None, None)).allowed);
    }

    #[test]
    fn compound_and_requires_all() {
        let policy = AccessPolicy::of(PolicyKind::Compound {
            combinator: PolicyCombinator::And,
            policies: vec![
                AccessPolicy::of(PolicyKind::RoleBased {
                    roles: vec!["operator".into()],
                }),
                AccessPolicy::of(PolicyKind::ReputationGated {
                    min_reputation_score: 0.5,
                }),
            ],
        });
        assert!(eval(&policy, &actor(Some("operator"), Some(0.8))).allowed);
        assert!(!eval(&policy, &actor(Some("operator"), Some(0.2))).allowed);
        assert!(!eval(&policy, &actor(Some("viewer"), Some(0.8))).allowed);
    }

    #[test]
    fn compound_or_accepts_any() {
        let policy = AccessPolicy::of(PolicyKind::Compound {
            combinator: PolicyCombinator::Or,
            policies: vec![
                AccessPolicy::of(PolicyKind::RoleBased {
                    roles: vec!["admin".into()],
                }),
                AccessPolicy::of(PolicyKind::ReputationGated {
                    min_reputation_score: 0.9,
                }),
            ],
        });
        assert!(eval(&policy, &actor(Some("admin"), None)).allowed);
        assert!(eval(&policy, &actor(Some("viewer"), Some(0.95))).allowed);
        assert!(!eval(&policy, &actor(Some("viewer"), Some(0.1))).allowed);
    }

    #[test]
    fn compound_or_short_circuits_on_first_allow() {
        // The second sub-policy is `none`; with or-combination the first
        // allow already decides.
        let policy = AccessPolicy::of(PolicyKind::Compound {
            combinator: PolicyCombinator::Or,
            policies: vec![
                AccessPolicy::of(PolicyKind::RoleBased {
                    roles: vec!["admin".into()],
                }),
                AccessPolicy::of(PolicyKind::None),
            ],
        });
        assert!(eval(&policy, &actor(Some("admin"), None)).allowed);
    }

    #[test]
    fn predicate_is_anded_into_the_decision() {
        let policy = AccessPolicy {
            kind: PolicyKind::RoleBased {
                roles: vec!["operator".into()],
            },
            predicate: Some("resource.frozen == false".into()),
        };
        let ctx = json!({"resource": {"frozen": false}});
        let allowed =
            evaluate_access_policy(&policy, &actor(Some("operator"), None), &ctx, None);
        assert!(allowed.allowed);

        let frozen = json!({"resource": {"frozen": true}});
        let denied =
            evaluate_access_policy(&policy, &actor(Some("operator"), None), &frozen, None);
        assert!(!denied.allowed);
        assert!(denied.reason.contains("predicate not satisfied"));
    }

    #[test]
    fn predicate_is_skipped_when_kind_already_denies() {
        let policy = AccessPolicy {
            kind: PolicyKind::None,
            predicate: Some("true".into()),
        };
        assert!(!eval(&policy, &actor(None, None)).allowed);
    }

    #[test]
    fn malformed_predicate_fails_closed() {
        let policy = AccessPolicy {
            kind: PolicyKind::RoleBased {
                roles: vec!["operator".into()],
            },
            predicate: Some("resource.frozen ==".into()),
        };
        let result = eval(&policy, &actor(Some("operator"), None));
        assert!(!result.allowed);
        assert!(result.reason.contains("failed to parse"));
    }

    #[test]
    fn serde_round_trips_tagged_policies() {
        let raw = json!({
            "type": "compound",
            "combinator": "and",
            "policies": [
                {"type": "role_based", "roles": ["admin"]},
                {"type": "reputation_gated", "min_reputation_score": 0.5,
                 "predicate": "resource.active == true"}
            ]
        });
        let policy: AccessPolicy = serde_json::from_value(raw.clone()).unwrap();
        match &policy.kind {
            PolicyKind::Compound { policies, .. } => {
                assert_eq!(policies.len(), 2);
                assert!(policies[1].predicate.is_some());
            }
            other => panic!("expected compound, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&policy).unwrap(), raw);
    }
}
